//=========================================================================
// Breakout: Entry Point
//
// Schedules the game on the UI thread, prints the ball sprite path, then
// hands the main thread to the UI event loop until the last frame closes.
//
//=========================================================================

use std::io;

use anyhow::{Context, Result};
use log::info;

use breakout::logging::{init_logging, LoggingConfig};
use breakout::{launch_breakout, UiThread};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let ui = UiThread::builder()
        .build()
        .context("failed to create UI event loop")?;

    launch_breakout(&ui.dispatcher(), &mut io::stdout().lock())
        .context("failed to launch Breakout")?;

    ui.run().context("UI event loop terminated with error")?;

    info!("Breakout exited");
    Ok(())
}

//=========================================================================
// Breakout: Library Root
//
// Start-up plumbing for the Breakout game: a UI thread that owns the
// window event loop, a dispatcher for handing it work, and the game
// collaborators it constructs.
//
// Typical usage:
// ```no_run
// use breakout::{bootstrap, ui::UiThread};
//
// fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let ui = UiThread::builder().build()?;
//     bootstrap::launch_breakout(&ui.dispatcher(), &mut std::io::stdout())?;
//     ui.run()?;
//     Ok(())
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `bootstrap` is the start-up sequence. `ui` is the UI-owning thread and
// its task dispatcher. `frame` and `game` are the collaborators a task
// builds on that thread. `logging` installs the log backend.
//
pub mod bootstrap;
pub mod frame;
pub mod game;
pub mod logging;
pub mod ui;

//--- Re-exports ----------------------------------------------------------

pub use bootstrap::{launch, launch_breakout, BootError};
pub use game::{Breakout, Game};
pub use ui::{Dispatcher, UiThread};

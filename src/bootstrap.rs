//=========================================================================
// Bootstrap
//
// Process start-up sequence.
//
// Control flow:
// ```text
//  launch()
//   ├─ invoke_later(task) ──────► [UI thread, later]
//   │                               ├─ stage.create_frame()
//   │                               ├─ make_game(frame)
//   │                               ├─ game.start()
//   │                               └─ stage.retain(game)
//   └─ writeln!(out, diagnostic_line())
// ```
//
// `launch` returns as soon as both steps are initiated; it never waits
// for the UI task, and the line is printed even if scheduling fails.
// Failures inside the task are logged on the UI thread and do not reach
// the caller.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::io::{self, Write};
use std::path::MAIN_SEPARATOR;

//=== External Crates =====================================================

use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use crate::frame::GameFrame;
use crate::game::{Breakout, Game};
use crate::ui::{DispatchError, Dispatcher, Stage};

//=== BootError ===========================================================

/// Errors surfaced by [`launch`] itself.
#[derive(Debug)]
pub enum BootError {
    /// The UI thread refused the start-up task.
    Dispatch(DispatchError),

    /// The diagnostic line could not be written.
    Output(io::Error),
}

impl std::fmt::Display for BootError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatch(e) => write!(f, "Could not schedule game start-up: {}", e),
            Self::Output(e) => write!(f, "Could not write diagnostic line: {}", e),
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dispatch(e) => Some(e),
            Self::Output(e) => Some(e),
        }
    }
}

impl From<DispatchError> for BootError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl From<io::Error> for BootError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

//=== Asset Paths =========================================================

/// Path of the ball sprite below `assets_root`.
///
/// `assets_root` is kept verbatim; only the separators inserted between
/// `images`, `entities` and `ball.png` follow `separator`.
///
/// ```
/// use breakout::bootstrap::ball_sprite_path;
///
/// assert_eq!(ball_sprite_path("assets/", '\\'), "assets/images\\entities\\ball.png");
/// ```
pub fn ball_sprite_path(assets_root: &str, separator: char) -> String {
    format!("{assets_root}images{separator}entities{separator}ball.png")
}

/// Line printed at start-up: the ball sprite path on this platform.
pub fn diagnostic_line() -> String {
    ball_sprite_path(Breakout::ASSETS_PATH, MAIN_SEPARATOR)
}

//=== Launch ==============================================================

/// Schedules frame and game construction on the UI thread, then writes
/// [`diagnostic_line`] to `out`.
///
/// The line is written whether or not the UI thread accepted the task.
///
/// # Errors
///
/// Returns [`BootError::Output`] if `out` fails, otherwise
/// [`BootError::Dispatch`] if the UI thread is gone. Nothing that happens
/// inside the scheduled task is reported here.
pub fn launch<D, F, G, W>(dispatcher: &D, make_game: F, out: &mut W) -> Result<(), BootError>
where
    D: Dispatcher + ?Sized,
    F: FnOnce(GameFrame) -> G + Send + 'static,
    G: Game + 'static,
    W: Write,
{
    let scheduled = dispatcher.invoke_later(Box::new(move |stage: &mut dyn Stage| {
        let frame = match stage.create_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(target: "bootstrap", "Cannot create game frame: {}", e);
                return;
            }
        };

        let mut game = make_game(frame);
        if let Err(e) = game.start() {
            error!(target: "bootstrap", "Game failed to start: {}", e);
            return;
        }

        debug!(target: "bootstrap", "Game started on frame {:?}", game.frame_id());
        stage.retain(Box::new(game));
    }));

    match &scheduled {
        Ok(()) => info!(target: "bootstrap", "Game start-up scheduled on UI thread"),
        Err(e) => error!(target: "bootstrap", "Game start-up not scheduled: {}", e),
    }

    writeln!(out, "{}", diagnostic_line())?;
    out.flush()?;
    scheduled.map_err(BootError::Dispatch)
}

/// [`launch`] with [`Breakout`] as the game.
pub fn launch_breakout<D, W>(dispatcher: &D, out: &mut W) -> Result<(), BootError>
where
    D: Dispatcher + ?Sized,
    W: Write,
{
    launch(dispatcher, Breakout::new, out)
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Breakout
//
// The Breakout game variant.
//
// Owns its frame on the UI thread and runs its update loop on a logic
// thread. Frame events cross over through a bounded channel; the UI
// side never blocks on it.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::thread::JoinHandle;

//=== External Crates =====================================================

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{error, info, trace, warn};

//=== Internal Dependencies ===============================================

use super::{FrameControl, Game, GameError, GameLoop, LoopStats};
use crate::frame::{FrameEvent, FrameId, GameFrame};

//=== Runner ==============================================================

struct Runner {
    events: Sender<FrameEvent>,
    handle: JoinHandle<LoopStats>,
}

//=== Breakout ============================================================

/// Breakout bound to a [`GameFrame`].
///
/// # Examples
///
/// ```
/// use breakout::frame::{FrameConfig, GameFrame};
/// use breakout::game::{Breakout, Game};
///
/// let mut game = Breakout::new(GameFrame::headless(FrameConfig::default()));
/// game.start().unwrap();
/// assert!(game.is_running());
/// ```
pub struct Breakout {
    frame: GameFrame,
    game_loop: Option<GameLoop>,
    runner: Option<Runner>,
}

impl Breakout {
    /// Root of the game's asset tree, relative to the working directory.
    pub const ASSETS_PATH: &'static str = "assets/";

    pub const TITLE: &'static str = "Breakout";

    /// Frame events buffered between UI and logic thread.
    const EVENT_CAPACITY: usize = 128;

    /// Creates the game with a default 60 TPS loop.
    pub fn new(frame: GameFrame) -> Self {
        Self::with_loop(frame, GameLoop::new())
    }

    pub fn with_loop(frame: GameFrame, game_loop: GameLoop) -> Self {
        Self {
            frame,
            game_loop: Some(game_loop),
            runner: None,
        }
    }

    pub fn frame(&self) -> &GameFrame {
        &self.frame
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_some()
    }

    /// Spawns the update loop through `spawn`, then shows the frame.
    ///
    /// The loop settings are only consumed once `spawn` succeeds, so a
    /// failed spawn leaves the game startable.
    fn launch_loop<S>(&mut self, spawn: S) -> Result<(), GameError>
    where
        S: FnOnce(GameLoop, Receiver<FrameEvent>) -> Result<JoinHandle<LoopStats>, GameError>,
    {
        let game_loop = *self.game_loop.as_ref().ok_or(GameError::AlreadyStarted)?;

        let (events, receiver) = bounded(Self::EVENT_CAPACITY);
        let handle = spawn(game_loop, receiver)?;

        self.game_loop = None;
        self.runner = Some(Runner { events, handle });

        self.frame.set_title(Self::TITLE);
        self.frame.show();
        self.frame.request_redraw();

        info!(target: "game", "Breakout started on frame {:?}", self.frame.id());
        Ok(())
    }

    fn forward(&self, event: FrameEvent) {
        let Some(runner) = &self.runner else {
            return;
        };

        match runner.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(target: "game", "Game loop behind, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!(target: "game", "Game loop gone, ignoring {:?}", event);
            }
        }
    }
}

impl Game for Breakout {
    fn frame_id(&self) -> FrameId {
        self.frame.id()
    }

    fn start(&mut self) -> Result<(), GameError> {
        self.launch_loop(|game_loop, receiver| {
            let tps = game_loop.tps().round().max(1.0) as u64;
            game_loop.spawn(receiver, move |tick| {
                if tick.number % tps == 0 {
                    trace!(
                        target: "game",
                        "Breakout tick {} (focused: {})",
                        tick.number,
                        tick.focused
                    );
                }
            })
        })
    }

    fn handle(&mut self, event: &FrameEvent) -> FrameControl {
        self.forward(*event);

        match event {
            FrameEvent::CloseRequested => FrameControl::Close,
            _ => FrameControl::Keep,
        }
    }
}

impl Drop for Breakout {
    fn drop(&mut self) {
        let Some(runner) = self.runner.take() else {
            return;
        };

        // A full queue still ends the loop: dropping the sender disconnects it.
        let _ = runner.events.try_send(FrameEvent::CloseRequested);
        drop(runner.events);

        match runner.handle.join() {
            Ok(stats) => info!(
                target: "game",
                "Breakout stopped after {} ticks",
                stats.ticks
            ),
            Err(e) => error!(target: "game", "Game loop panicked: {:?}", e),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameConfig;

    fn headless_game() -> Breakout {
        let frame = GameFrame::headless(FrameConfig::default().with_title("untitled"));
        Breakout::with_loop(frame, GameLoop::new().with_tps(1000.0))
    }

    #[test]
    fn new_game_is_idle_and_hidden() {
        let game = headless_game();
        assert!(!game.is_running());
        assert!(!game.frame().is_visible());
    }

    #[test]
    fn start_titles_and_shows_frame() {
        let mut game = headless_game();

        game.start().unwrap();

        assert!(game.is_running());
        assert!(game.frame().is_visible());
        assert_eq!(game.frame().title(), Breakout::TITLE);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut game = headless_game();
        game.start().unwrap();

        assert!(matches!(game.start(), Err(GameError::AlreadyStarted)));
    }

    #[test]
    fn failed_spawn_leaves_game_startable() {
        let mut game = headless_game();

        let result = game.launch_loop(|_game_loop, _receiver| {
            Err(GameError::LoopSpawn(std::io::Error::other("no threads left")))
        });

        assert!(matches!(result, Err(GameError::LoopSpawn(_))));
        assert!(!game.is_running());
        assert!(!game.frame().is_visible());

        game.start().unwrap();
        assert!(game.is_running());
        assert!(game.frame().is_visible());
    }

    #[test]
    fn close_request_closes_frame() {
        let mut game = headless_game();
        game.start().unwrap();

        assert_eq!(game.handle(&FrameEvent::Focused(false)), FrameControl::Keep);
        assert_eq!(game.handle(&FrameEvent::CloseRequested), FrameControl::Close);
    }

    #[test]
    fn events_before_start_are_ignored() {
        let mut game = headless_game();
        assert_eq!(game.handle(&FrameEvent::Redraw), FrameControl::Keep);
        assert!(!game.is_running());
    }

    #[test]
    fn frame_id_matches_frame() {
        let game = headless_game();
        assert_eq!(game.frame_id(), game.frame().id());
    }

    #[test]
    fn drop_joins_running_loop() {
        let mut game = headless_game();
        game.start().unwrap();
        drop(game);
    }

    #[test]
    fn assets_path_is_relative_root() {
        assert_eq!(Breakout::ASSETS_PATH, "assets/");
    }
}

//=========================================================================
// Game
//
// Contract between the UI thread and a concrete game variant.
//
// Architecture:
// ```text
//  UI Thread:                         Logic Thread:
//  ┌──────────────────────────┐      ┌──────────────────┐
//  │  Stage                   │      │  GameLoop @ TPS  │
//  │   └─ Box<dyn Game>       │      │   └─ on_tick()   │
//  │        ├─ GameFrame      │      │                  │
//  │        └─ handle(event) ─┼──────┼─► FrameEvent     │
//  └──────────────────────────┘      └──────────────────┘
// ```
//
// A game is constructed from the frame it attaches to, started once,
// and then retained by the UI thread, which feeds it frame events until
// the frame closes.
//
//=========================================================================

//=== Module Declarations =================================================

mod breakout;
mod game_loop;

//=== Public API ==========================================================

pub use breakout::Breakout;
pub use game_loop::{GameLoop, LoopStats, Tick};

//=== Internal Dependencies ===============================================

use crate::frame::{FrameEvent, FrameId};

//=== FrameControl ========================================================

/// What the UI thread should do with a frame after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Keep,
    Close,
}

//=== GameError ===========================================================

/// Game startup errors.
#[derive(Debug)]
pub enum GameError {
    /// `start()` was called on a game that is already running.
    AlreadyStarted,

    /// The logic thread could not be spawned.
    LoopSpawn(std::io::Error),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "Game already started"),
            Self::LoopSpawn(e) => write!(f, "Failed to spawn game loop: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyStarted => None,
            Self::LoopSpawn(e) => Some(e),
        }
    }
}

//=== Game ================================================================

/// A game variant bound to a [`GameFrame`](crate::frame::GameFrame).
///
/// Implementations live on the UI thread once started and do not need
/// to be `Send`.
pub trait Game {
    /// Frame this game is attached to.
    fn frame_id(&self) -> FrameId;

    /// Starts the game. Called exactly once, on the UI thread.
    fn start(&mut self) -> Result<(), GameError>;

    /// Reacts to a window event on the game's frame.
    ///
    /// The default closes the frame when the user asks for it.
    fn handle(&mut self, event: &FrameEvent) -> FrameControl {
        match event {
            FrameEvent::CloseRequested => FrameControl::Close,
            _ => FrameControl::Keep,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

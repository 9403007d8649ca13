//=========================================================================
// Stage
//=========================================================================
//
// What the UI thread lends to the tasks it runs: frame construction and
// a place to keep games alive once started.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::HashMap;

//=== External Crates =====================================================

use log::{debug, info};
use winit::event_loop::ActiveEventLoop;

//=== Internal Dependencies ===============================================

use crate::frame::{FrameConfig, FrameError, FrameEvent, FrameId, GameFrame};
use crate::game::{FrameControl, Game};

//=== Stage ===============================================================

/// UI-thread capabilities available inside a [`UiTask`](super::UiTask).
pub trait Stage {
    /// Constructs a new hidden frame using the UI thread's default config.
    fn create_frame(&mut self) -> Result<GameFrame, FrameError>;

    /// Hands a started game to the UI thread, which keeps it until its
    /// frame closes.
    fn retain(&mut self, game: Box<dyn Game>);
}

//=== GameRegistry ========================================================

/// Games owned by the UI thread, keyed by frame.
#[derive(Default)]
pub(crate) struct GameRegistry {
    games: HashMap<FrameId, Box<dyn Game>>,
}

impl GameRegistry {
    pub(crate) fn insert(&mut self, game: Box<dyn Game>) {
        let id = game.frame_id();
        if self.games.insert(id, game).is_some() {
            debug!(target: "ui", "Replaced game on frame {:?}", id);
        }
    }

    /// Routes `event` to the game on frame `id`.
    ///
    /// A game answering [`FrameControl::Close`] is dropped, which closes
    /// its frame. Returns `None` if no game owns the frame.
    pub(crate) fn dispatch(&mut self, id: FrameId, event: &FrameEvent) -> Option<FrameControl> {
        let control = self.games.get_mut(&id)?.handle(event);

        if control == FrameControl::Close {
            self.games.remove(&id);
            info!(target: "ui", "Frame {:?} closed ({} open)", id, self.games.len());
        }

        Some(control)
    }

    pub(crate) fn len(&self) -> usize {
        self.games.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

//=== WindowStage =========================================================

/// [`Stage`] backed by the running winit event loop.
pub(crate) struct WindowStage<'a> {
    event_loop: &'a ActiveEventLoop,
    frame_config: &'a FrameConfig,
    registry: &'a mut GameRegistry,
}

impl<'a> WindowStage<'a> {
    pub(crate) fn new(
        event_loop: &'a ActiveEventLoop,
        frame_config: &'a FrameConfig,
        registry: &'a mut GameRegistry,
    ) -> Self {
        Self {
            event_loop,
            frame_config,
            registry,
        }
    }
}

impl Stage for WindowStage<'_> {
    fn create_frame(&mut self) -> Result<GameFrame, FrameError> {
        GameFrame::open(self.event_loop, self.frame_config.clone())
    }

    fn retain(&mut self, game: Box<dyn Game>) {
        self.registry.insert(game);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

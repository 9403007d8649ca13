//=========================================================================
// Game Frame
//
// Top-level display surface a game attaches to.
//
// A frame either wraps an OS window created on the UI thread, or is
// headless (no window) for tests and off-screen runs. Frames start
// hidden; the game decides when to show them.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::atomic::{AtomicU64, Ordering};

//=== External Crates =====================================================

use log::debug;
use winit::{
    dpi::LogicalSize,
    error::OsError,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes, WindowId},
};

//=== FrameConfig =========================================================

/// Initial window settings used when the UI thread constructs a frame.
///
/// # Default Values
///
/// - **Title**: `"Breakout"`
/// - **Size**: 800x600 logical pixels
/// - **Resizable**: no
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl FrameConfig {
    /// Sets the initial window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the initial inner size in logical pixels.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "Frame size must be positive, got {}x{}",
            width,
            height
        );
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
            .with_visible(false)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            title: "Breakout".to_string(),
            width: 800,
            height: 600,
            resizable: false,
        }
    }
}

//=== FrameId =============================================================

/// Identifies a frame on the UI thread.
///
/// Window-backed frames reuse the OS window id so window events can be
/// routed back to the game that owns the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameId {
    Window(WindowId),
    Headless(u64),
}

impl FrameId {
    fn next_headless() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self::Headless(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<WindowId> for FrameId {
    fn from(id: WindowId) -> Self {
        Self::Window(id)
    }
}

//=== FrameEvent ==========================================================

/// Window events delivered to the game bound to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// The OS asked for the frame to be repainted.
    Redraw,

    /// Inner size changed (physical pixels).
    Resized { width: u32, height: u32 },

    /// Keyboard focus gained (`true`) or lost (`false`).
    Focused(bool),

    /// User or OS asked to close the frame.
    CloseRequested,
}

//=== FrameError ==========================================================

/// Frame construction errors.
#[derive(Debug)]
pub enum FrameError {
    /// The OS refused to create the window.
    Creation(OsError),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creation(e) => write!(f, "Frame creation failed: {}", e),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Creation(e) => Some(e),
        }
    }
}

//=== GameFrame ===========================================================

/// Display surface owned by a game once constructed.
///
/// # Thread Safety
///
/// Window-backed frames must only be created on the UI thread (see
/// [`crate::ui::Stage::create_frame`]). Headless frames can be created
/// anywhere.
#[derive(Debug)]
pub struct GameFrame {
    id: FrameId,
    config: FrameConfig,
    visible: bool,
    window: Option<Window>,
}

impl GameFrame {
    //--- Construction -----------------------------------------------------

    /// Opens a hidden OS window described by `config`.
    pub(crate) fn open(event_loop: &ActiveEventLoop, config: FrameConfig) -> Result<Self, FrameError> {
        let window = event_loop
            .create_window(config.window_attributes())
            .map_err(FrameError::Creation)?;

        debug!(
            target: "ui",
            "Frame {:?} opened: {}x{} @ {}x DPI",
            window.id(),
            window.inner_size().width,
            window.inner_size().height,
            window.scale_factor()
        );

        Ok(Self {
            id: FrameId::from(window.id()),
            config,
            visible: false,
            window: Some(window),
        })
    }

    /// Creates a frame with no OS window behind it.
    pub fn headless(config: FrameConfig) -> Self {
        Self {
            id: FrameId::next_headless(),
            config,
            visible: false,
            window: None,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// Logical size the frame was configured with.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_headless(&self) -> bool {
        self.window.is_none()
    }

    //--- Mutation ---------------------------------------------------------

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
        if let Some(window) = &self.window {
            window.set_title(&self.config.title);
        }
    }

    /// Makes the frame visible. No-op if already shown.
    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        if let Some(window) = &self.window {
            window.set_visible(true);
        }
    }

    /// Schedules a [`FrameEvent::Redraw`] for this frame.
    ///
    /// Headless frames ignore the request.
    pub fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

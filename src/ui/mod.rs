//=========================================================================
// UI Thread
//
// Owns the winit event loop and runs queued tasks on it.
//
// Architecture:
// ```text
//  Any Thread:                      Main (UI) Thread:
//  ┌──────────────────────┐        ┌──────────────────────────────┐
//  │  UiDispatcher        │        │  Winit Event Loop            │
//  │   └─ invoke_later() ─┼─task──►│   ├─ resumed / user_event    │
//  │                      │        │   │    └─ TaskQueue → Stage  │
//  └──────────────────────┘        │   └─ window_event            │
//                                  │        └─ GameRegistry       │
//                                  └──────────────────────────────┘
// ```
//
// Key rules:
// - Tasks never run before the loop is resumed (windows need an active
//   loop); anything queued earlier runs on `resumed`.
// - At most `max_tasks_per_wake` tasks run per wake-up; a backlog
//   schedules another wake-up.
// - With `exit_when_idle`, the loop exits once no frame is open and no
//   task is queued.
// - Winit mandates the main thread on macOS/iOS, so `UiThread` must be
//   built and run there.
//
//=========================================================================

//=== Submodules ==========================================================

mod dispatcher;
mod stage;

//=== Public API ==========================================================

pub use dispatcher::{DispatchError, Dispatcher, UiDispatcher, UiTask};
pub use stage::Stage;

//=== External Crates =====================================================

use log::*;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::WindowId,
};

//=== Internal Imports ====================================================

use crate::frame::{FrameConfig, FrameEvent, FrameId};
use dispatcher::{Drain, TaskQueue, UiWake};
use stage::{GameRegistry, WindowStage};

//=== UiError =============================================================

/// UI thread initialization and runtime errors.
#[derive(Debug)]
pub enum UiError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    EventLoopCreation(winit::error::EventLoopError),

    /// Event loop execution error.
    EventLoopExecution(winit::error::EventLoopError),
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLoopCreation(e) => write!(f, "Event loop creation failed: {}", e),
            Self::EventLoopExecution(e) => write!(f, "Event loop error: {}", e),
        }
    }
}

impl std::error::Error for UiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EventLoopCreation(e) | Self::EventLoopExecution(e) => Some(e),
        }
    }
}

//=== UiThreadBuilder =====================================================

/// Builder for [`UiThread`].
///
/// # Default Values
///
/// - **Frame config**: [`FrameConfig::default`]
/// - **Tasks per wake**: 64
/// - **Exit when idle**: true
///
/// # Examples
///
/// ```no_run
/// use breakout::frame::FrameConfig;
/// use breakout::ui::UiThread;
///
/// let ui = UiThread::builder()
///     .with_frame_config(FrameConfig::default().with_size(1024, 768))
///     .with_max_tasks_per_wake(16)
///     .build()?;
/// ui.run()?;
/// # Ok::<(), breakout::ui::UiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct UiThreadBuilder {
    frame_config: FrameConfig,
    max_tasks_per_wake: usize,
    exit_when_idle: bool,
}

impl UiThreadBuilder {
    pub fn new() -> Self {
        Self {
            frame_config: FrameConfig::default(),
            max_tasks_per_wake: 64,
            exit_when_idle: true,
        }
    }

    /// Settings for frames built by [`Stage::create_frame`].
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Caps how many tasks run per wake-up so window events keep flowing.
    ///
    /// # Panics
    ///
    /// Panics if `max == 0`.
    pub fn with_max_tasks_per_wake(mut self, max: usize) -> Self {
        assert!(max > 0, "Tasks per wake must be positive");
        self.max_tasks_per_wake = max;
        self
    }

    /// Whether the loop exits once every frame has closed.
    pub fn with_exit_when_idle(mut self, exit: bool) -> Self {
        self.exit_when_idle = exit;
        self
    }

    /// Creates the event loop.
    ///
    /// # Errors
    ///
    /// Fails if the OS event loop cannot be created, or if an event loop
    /// already exists in this process.
    pub fn build(self) -> Result<UiThread, UiError> {
        let event_loop = EventLoop::<UiWake>::with_user_event()
            .build()
            .map_err(UiError::EventLoopCreation)?;

        let (dispatcher, tasks) = dispatcher::channel(Some(event_loop.create_proxy()));

        info!(
            target: "ui",
            "UI thread ready (tasks per wake: {}, exit when idle: {})",
            self.max_tasks_per_wake,
            self.exit_when_idle
        );

        Ok(UiThread {
            event_loop,
            runtime: UiRuntime {
                tasks,
                waker: dispatcher.clone(),
                registry: GameRegistry::default(),
                frame_config: self.frame_config,
                max_tasks_per_wake: self.max_tasks_per_wake,
                exit_when_idle: self.exit_when_idle,
                resumed: false,
            },
            dispatcher,
        })
    }
}

impl Default for UiThreadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== UiThread ============================================================

/// The UI-owning thread's event loop, not yet running.
///
/// This type is NOT Send; it stays on the thread that built it. Other
/// threads talk to it through [`UiDispatcher`].
pub struct UiThread {
    event_loop: EventLoop<UiWake>,
    runtime: UiRuntime,
    dispatcher: UiDispatcher,
}

impl UiThread {
    pub fn builder() -> UiThreadBuilder {
        UiThreadBuilder::new()
    }

    /// Handle for submitting tasks; cheap to clone and send.
    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }

    /// Runs the event loop until it exits.
    pub fn run(self) -> Result<(), UiError> {
        let UiThread {
            event_loop,
            mut runtime,
            ..
        } = self;

        debug!(target: "ui", "Entering event loop");
        event_loop
            .run_app(&mut runtime)
            .map_err(UiError::EventLoopExecution)?;

        info!(target: "ui", "Event loop exited");
        Ok(())
    }
}

//=== UiRuntime ===========================================================

struct UiRuntime {
    tasks: TaskQueue,
    waker: UiDispatcher,
    registry: GameRegistry,
    frame_config: FrameConfig,
    max_tasks_per_wake: usize,
    exit_when_idle: bool,
    resumed: bool,
}

impl UiRuntime {
    fn drain_tasks(&mut self, event_loop: &ActiveEventLoop) {
        let mut stage = WindowStage::new(event_loop, &self.frame_config, &mut self.registry);

        match drain_step(&self.tasks, self.resumed, &mut stage, self.max_tasks_per_wake) {
            None => return,
            Some(Drain::Idle { ran }) => trace!(
                target: "ui",
                "Ran {} tasks ({} frames open)",
                ran,
                self.registry.len()
            ),
            Some(Drain::Backlog { .. }) => {
                if self.waker.wake().is_err() {
                    warn!(target: "ui", "Could not reschedule task backlog");
                }
            }
        }

        self.exit_if_idle(event_loop);
    }

    fn exit_if_idle(&self, event_loop: &ActiveEventLoop) {
        if should_exit(self.exit_when_idle, self.registry.is_empty(), self.tasks.is_empty()) {
            info!(target: "ui", "No frames open, leaving event loop");
            self.tasks.close();
            event_loop.exit();
        }
    }
}

/// Runs queued tasks once the loop has resumed.
///
/// Returns `None` before the first `resumed`, leaving the queue as is.
fn drain_step(tasks: &TaskQueue, resumed: bool, stage: &mut dyn Stage, limit: usize) -> Option<Drain> {
    if !resumed {
        trace!(target: "ui", "Wake before resume, deferring tasks");
        return None;
    }
    Some(tasks.run_pending(stage, limit))
}

/// Idle rule: no frame open and nothing left to run.
fn should_exit(exit_when_idle: bool, registry_empty: bool, queue_empty: bool) -> bool {
    exit_when_idle && registry_empty && queue_empty
}

/// Maps the window events games care about.
fn frame_event(event: &WindowEvent) -> Option<FrameEvent> {
    match event {
        WindowEvent::RedrawRequested => Some(FrameEvent::Redraw),
        WindowEvent::Resized(size) => Some(FrameEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::Focused(focused) => Some(FrameEvent::Focused(*focused)),
        WindowEvent::CloseRequested => Some(FrameEvent::CloseRequested),
        _ => None,
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler<UiWake> for UiRuntime {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.resumed {
            debug!(target: "ui", "Resumed again (mobile resume?)");
            return;
        }

        self.resumed = true;
        self.drain_tasks(event_loop);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _wake: UiWake) {
        self.drain_tasks(event_loop);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.tasks.close();
        debug!(target: "ui", "Task queue closed ({} frames still open)", self.registry.len());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(event) = frame_event(&event) else {
            return;
        };

        let id = FrameId::from(window_id);
        match self.registry.dispatch(id, &event) {
            Some(_) => {
                if event == FrameEvent::CloseRequested {
                    self.exit_if_idle(event_loop);
                }
            }
            None => trace!(target: "ui", "{:?} for unowned frame {:?}", event, id),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::launch;
    use crate::frame::{FrameError, GameFrame};
    use crate::game::{Game, GameError};
    use std::sync::{Arc, Mutex};
    use winit::dpi::PhysicalSize;

    //=====================================================================
    // Test Doubles
    //=====================================================================

    /// Headless stand-in for `WindowStage`.
    struct RegistryStage<'a> {
        registry: &'a mut GameRegistry,
    }

    impl Stage for RegistryStage<'_> {
        fn create_frame(&mut self) -> Result<GameFrame, FrameError> {
            Ok(GameFrame::headless(FrameConfig::default()))
        }

        fn retain(&mut self, game: Box<dyn Game>) {
            self.registry.insert(game);
        }
    }

    struct TestGame {
        frame: GameFrame,
        starts: bool,
    }

    impl Game for TestGame {
        fn frame_id(&self) -> FrameId {
            self.frame.id()
        }

        fn start(&mut self) -> Result<(), GameError> {
            if self.starts {
                Ok(())
            } else {
                Err(GameError::AlreadyStarted)
            }
        }
    }

    fn noting_task(log: &Arc<Mutex<Vec<u32>>>, n: u32) -> UiTask {
        let log = Arc::clone(log);
        Box::new(move |_stage: &mut dyn Stage| log.lock().unwrap().push(n))
    }

    //=====================================================================
    // Run Loop Rule Tests
    //=====================================================================

    #[test]
    fn wake_before_resume_leaves_queue_untouched() {
        let (dispatcher, queue) = dispatcher::channel(None);
        let mut registry = GameRegistry::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.invoke_later(noting_task(&log, 1)).unwrap();

        let mut stage = RegistryStage { registry: &mut registry };
        assert_eq!(drain_step(&queue, false, &mut stage, 64), None);
        assert!(!queue.is_empty());
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(drain_step(&queue, true, &mut stage, 64), Some(Drain::Idle { ran: 1 }));
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn backlog_blocks_exit() {
        let (dispatcher, queue) = dispatcher::channel(None);
        let mut registry = GameRegistry::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.invoke_later(noting_task(&log, 1)).unwrap();
        dispatcher.invoke_later(noting_task(&log, 2)).unwrap();

        let drain = drain_step(&queue, true, &mut RegistryStage { registry: &mut registry }, 1);

        assert_eq!(drain, Some(Drain::Backlog { ran: 1, pending: 1 }));
        assert!(!should_exit(true, registry.is_empty(), queue.is_empty()));
    }

    #[test]
    fn failed_startup_task_leads_to_exit() {
        let (dispatcher, queue) = dispatcher::channel(None);
        let mut registry = GameRegistry::default();
        launch(
            &dispatcher,
            |frame| TestGame { frame, starts: false },
            &mut Vec::new(),
        )
        .unwrap();

        drain_step(&queue, true, &mut RegistryStage { registry: &mut registry }, 64);

        assert!(registry.is_empty());
        assert!(should_exit(true, registry.is_empty(), queue.is_empty()));
    }

    #[test]
    fn started_game_keeps_loop_alive() {
        let (dispatcher, queue) = dispatcher::channel(None);
        let mut registry = GameRegistry::default();
        launch(
            &dispatcher,
            |frame| TestGame { frame, starts: true },
            &mut Vec::new(),
        )
        .unwrap();

        drain_step(&queue, true, &mut RegistryStage { registry: &mut registry }, 64);

        assert_eq!(registry.len(), 1);
        assert!(!should_exit(true, registry.is_empty(), queue.is_empty()));
    }

    #[test]
    fn exit_when_idle_disabled_never_exits() {
        assert!(!should_exit(false, true, true));
        assert!(should_exit(true, true, true));
    }

    //=====================================================================
    // Builder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = UiThreadBuilder::new();
        assert_eq!(builder.frame_config, FrameConfig::default());
        assert_eq!(builder.max_tasks_per_wake, 64);
        assert!(builder.exit_when_idle);
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let builder = UiThread::builder()
            .with_frame_config(FrameConfig::default().with_title("Test"))
            .with_max_tasks_per_wake(8)
            .with_exit_when_idle(false);

        assert_eq!(builder.frame_config.title, "Test");
        assert_eq!(builder.max_tasks_per_wake, 8);
        assert!(!builder.exit_when_idle);
    }

    #[test]
    #[should_panic(expected = "Tasks per wake must be positive")]
    fn builder_with_zero_tasks_per_wake_panics() {
        UiThreadBuilder::new().with_max_tasks_per_wake(0);
    }

    #[test]
    fn maps_game_relevant_window_events() {
        assert_eq!(frame_event(&WindowEvent::RedrawRequested), Some(FrameEvent::Redraw));
        assert_eq!(
            frame_event(&WindowEvent::CloseRequested),
            Some(FrameEvent::CloseRequested)
        );
        assert_eq!(
            frame_event(&WindowEvent::Focused(false)),
            Some(FrameEvent::Focused(false))
        );
        assert_eq!(
            frame_event(&WindowEvent::Resized(PhysicalSize::new(640, 480))),
            Some(FrameEvent::Resized { width: 640, height: 480 })
        );
    }

    #[test]
    fn ignores_other_window_events() {
        assert_eq!(frame_event(&WindowEvent::Destroyed), None);
        assert_eq!(frame_event(&WindowEvent::Occluded(true)), None);
    }

    #[test]
    fn ui_error_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<UiError>();
    }
}

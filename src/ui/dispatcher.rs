//=========================================================================
// UI Dispatcher
//=========================================================================
//
// Hands tasks from any thread to the UI thread.
//
// Architecture:
//   UiDispatcher ──Sender<UiTask>──> TaskQueue ──run_pending()──> Stage
//        └──EventLoopProxy<UiWake>──> user_event() (wake-up only)
//
// Tasks run in submission order. Submitting never waits for the task.
// Once the event loop is exiting the queue is closed and submissions are
// refused up front.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

//=== External Dependencies ===============================================

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{trace, warn};
use winit::event_loop::EventLoopProxy;

//=== Internal Dependencies ===============================================

use super::Stage;

//=== UiTask ==============================================================

/// Unit of work executed on the UI thread.
pub type UiTask = Box<dyn FnOnce(&mut dyn Stage) + Send>;

/// Wake-up signal carried by the winit event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiWake;

//=== DispatchError =======================================================

/// Task submission errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The UI thread has shut down; the task was dropped.
    Disconnected,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "UI thread is no longer running"),
        }
    }
}

impl std::error::Error for DispatchError {}

//=== Dispatcher ==========================================================

/// Submits tasks for later execution on the UI thread.
pub trait Dispatcher {
    /// Queues `task` and returns immediately.
    fn invoke_later(&self, task: UiTask) -> Result<(), DispatchError>;
}

//=== UiDispatcher ========================================================

/// Cloneable handle to the UI thread's task queue.
#[derive(Clone)]
pub struct UiDispatcher {
    tasks: Sender<UiTask>,
    waker: Option<EventLoopProxy<UiWake>>,
    open: Arc<AtomicBool>,
}

impl UiDispatcher {
    /// Nudges the event loop so it drains the queue.
    pub(crate) fn wake(&self) -> Result<(), DispatchError> {
        match &self.waker {
            Some(proxy) => proxy.send_event(UiWake).map_err(|_| DispatchError::Disconnected),
            None => Ok(()),
        }
    }
}

impl Dispatcher for UiDispatcher {
    /// Queues `task` unless the event loop is exiting.
    ///
    /// If the loop shuts down between the check and the wake-up, the task
    /// stays in a queue nobody drains and `Disconnected` is returned.
    fn invoke_later(&self, task: UiTask) -> Result<(), DispatchError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(DispatchError::Disconnected);
        }

        self.tasks.send(task).map_err(|_| DispatchError::Disconnected)?;
        trace!(target: "ui", "Task queued ({} pending)", self.tasks.len());
        self.wake()
    }
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("pending", &self.tasks.len())
            .field("wakes_event_loop", &self.waker.is_some())
            .field("open", &self.open.load(Ordering::Relaxed))
            .finish()
    }
}

/// Creates a connected dispatcher/queue pair.
///
/// Without a waker the queue must be drained by polling.
pub(crate) fn channel(waker: Option<EventLoopProxy<UiWake>>) -> (UiDispatcher, TaskQueue) {
    let (tasks, receiver) = unbounded();
    let open = Arc::new(AtomicBool::new(true));
    (
        UiDispatcher {
            tasks,
            waker,
            open: Arc::clone(&open),
        },
        TaskQueue { receiver, open },
    )
}

//=== TaskQueue ===========================================================

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drain {
    /// Queue emptied.
    Idle { ran: usize },

    /// Limit reached with tasks still queued.
    Backlog { ran: usize, pending: usize },
}

/// UI-thread end of the task channel.
pub(crate) struct TaskQueue {
    receiver: Receiver<UiTask>,
    open: Arc<AtomicBool>,
}

impl TaskQueue {
    /// Runs up to `limit` queued tasks, oldest first.
    pub(crate) fn run_pending(&self, stage: &mut dyn Stage, limit: usize) -> Drain {
        let mut ran = 0;

        while ran < limit {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task(&mut *stage);
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                    return Drain::Idle { ran };
                }
            }
        }

        match self.receiver.len() {
            0 => Drain::Idle { ran },
            pending => {
                warn!(target: "ui", "Task backlog: ran {} tasks, {} still queued", ran, pending);
                Drain::Backlog { ran, pending }
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Refuses further submissions. Tasks already queued are dropped with
    /// the queue.
    pub(crate) fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

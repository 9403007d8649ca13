//=========================================================================
// Game Loop
//
// Fixed-timestep update loop running on a dedicated logic thread.
//
// Each tick:
//  1. Drains pending frame events (bounded to prevent starvation)
//  2. Calls the game's tick hook
//  3. Sleeps to maintain fixed pacing
//  4. Exits on CloseRequested or when the UI side hangs up
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::GameError;
use crate::frame::FrameEvent;

//=== TickControl =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickControl {
    Continue,
    Exit,
}

//=== Tick ================================================================

/// Per-tick data handed to the game's tick hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// 1-based tick counter.
    pub number: u64,

    /// Fixed timestep.
    pub delta: Duration,

    /// Whether the frame currently has keyboard focus.
    pub focused: bool,
}

//=== LoopStats ===========================================================

/// Totals reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub events: u64,
}

//=== GameLoop ============================================================

/// Fixed-rate logic loop.
///
/// # Default Values
///
/// - **TPS**: 60.0
/// - **Events per tick**: 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameLoop {
    tps: f64,
    max_events_per_tick: usize,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            max_events_per_tick: 100,
        }
    }

    /// Sets the target ticks per second.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Caps how many frame events are drained in a single tick.
    ///
    /// # Panics
    ///
    /// Panics if `max == 0`.
    pub fn with_max_events_per_tick(mut self, max: usize) -> Self {
        assert!(max > 0, "Events per tick must be positive");
        self.max_events_per_tick = max;
        self
    }

    pub fn tps(&self) -> f64 {
        self.tps
    }

    //--- Execution --------------------------------------------------------

    /// Runs the loop on a new thread named `game-loop`.
    pub fn spawn<F>(
        self,
        receiver: Receiver<FrameEvent>,
        on_tick: F,
    ) -> Result<thread::JoinHandle<LoopStats>, GameError>
    where
        F: FnMut(&Tick) + Send + 'static,
    {
        thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || self.run(receiver, on_tick))
            .map_err(GameError::LoopSpawn)
    }

    /// Runs the loop on the calling thread until shutdown.
    pub fn run<F>(self, receiver: Receiver<FrameEvent>, mut on_tick: F) -> LoopStats
    where
        F: FnMut(&Tick),
    {
        let delta = Duration::from_secs_f64(1.0 / self.tps);
        let mut collector = EventCollector::new(receiver, self.max_events_per_tick);
        let mut stats = LoopStats::default();

        info!(target: "game", "Game loop running at {} TPS", self.tps);

        loop {
            let tick_start = Instant::now();

            if collector.collect_tick() == TickControl::Exit {
                break;
            }

            stats.ticks += 1;
            on_tick(&Tick {
                number: stats.ticks,
                delta,
                focused: collector.focused,
            });

            let elapsed = tick_start.elapsed();
            if elapsed < delta {
                thread::sleep(delta - elapsed);
            }
        }

        stats.events = collector.received;
        info!(
            target: "game",
            "Game loop exited after {} ticks ({} frame events)",
            stats.ticks,
            stats.events
        );
        stats
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

//=== EventCollector ======================================================

/// Drains frame events between ticks and tracks focus.
struct EventCollector {
    receiver: Receiver<FrameEvent>,
    max_per_tick: usize,
    focused: bool,
    received: u64,
}

impl EventCollector {
    fn new(receiver: Receiver<FrameEvent>, max_per_tick: usize) -> Self {
        Self {
            receiver,
            max_per_tick,
            focused: true,
            received: 0,
        }
    }

    fn collect_tick(&mut self) -> TickControl {
        let mut drained = 0;

        while drained < self.max_per_tick {
            match self.receiver.try_recv() {
                Ok(event) => {
                    drained += 1;
                    self.received += 1;
                    if self.handle_event(event) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= self.max_per_tick {
            warn!(target: "game", "Frame event backlog: drained {} events this tick", drained);
        }

        TickControl::Continue
    }

    fn handle_event(&mut self, event: FrameEvent) -> TickControl {
        match event {
            FrameEvent::CloseRequested => return TickControl::Exit,
            FrameEvent::Focused(focused) => self.focused = focused,
            FrameEvent::Resized { width, height } => {
                debug!(target: "game", "Frame resized to {}x{}", width, height);
            }
            FrameEvent::Redraw => {}
        }
        TickControl::Continue
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    //=====================================================================
    // Builder Tests
    //=====================================================================

    #[test]
    fn defaults() {
        let game_loop = GameLoop::new();
        assert_eq!(game_loop.tps, 60.0);
        assert_eq!(game_loop.max_events_per_tick, 100);
    }

    #[test]
    #[should_panic(expected = "TPS must be positive")]
    fn with_tps_panics_on_zero() {
        GameLoop::new().with_tps(0.0);
    }

    #[test]
    #[should_panic(expected = "Events per tick must be positive")]
    fn with_max_events_panics_on_zero() {
        GameLoop::new().with_max_events_per_tick(0);
    }

    //=====================================================================
    // Loop Tests
    //=====================================================================

    #[test]
    fn close_before_first_tick_runs_no_ticks() {
        let (tx, rx) = unbounded();
        tx.send(FrameEvent::CloseRequested).unwrap();

        let stats = GameLoop::new().with_tps(1000.0).run(rx, |_| panic!("should not tick"));

        assert_eq!(stats, LoopStats { ticks: 0, events: 1 });
    }

    #[test]
    fn exits_when_sender_dropped() {
        let (tx, rx) = unbounded::<FrameEvent>();
        drop(tx);

        let stats = GameLoop::new().with_tps(1000.0).run(rx, |_| {});

        assert_eq!(stats.ticks, 0);
    }

    #[test]
    fn ticks_until_close_requested() {
        let (tx, rx) = unbounded();
        let closer = tx.clone();
        let mut seen = Vec::new();

        let stats = GameLoop::new().with_tps(1000.0).run(rx, |tick| {
            seen.push(tick.number);
            if tick.number == 3 {
                closer.send(FrameEvent::CloseRequested).unwrap();
            }
        });

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(stats.ticks, 3);
        drop(tx);
    }

    #[test]
    fn focus_changes_reach_tick_hook() {
        let (tx, rx) = unbounded();
        tx.send(FrameEvent::Focused(false)).unwrap();
        let closer = tx.clone();
        let mut focus = Vec::new();

        GameLoop::new().with_tps(1000.0).run(rx, |tick| {
            focus.push(tick.focused);
            match tick.number {
                1 => closer.send(FrameEvent::Focused(true)).unwrap(),
                _ => closer.send(FrameEvent::CloseRequested).unwrap(),
            }
        });

        assert_eq!(focus, vec![false, true]);
    }

    #[test]
    fn backlog_is_spread_over_ticks() {
        let (tx, rx) = unbounded();
        for _ in 0..5 {
            tx.send(FrameEvent::Redraw).unwrap();
        }
        tx.send(FrameEvent::CloseRequested).unwrap();

        let stats = GameLoop::new()
            .with_tps(1000.0)
            .with_max_events_per_tick(2)
            .run(rx, |_| {});

        // Two full batches tick; the third batch ends with the close.
        assert_eq!(stats, LoopStats { ticks: 2, events: 6 });
    }

    #[test]
    fn spawn_returns_stats_on_join() {
        let (tx, rx) = unbounded();
        let handle = GameLoop::new().with_tps(1000.0).spawn(rx, |_| {}).unwrap();

        tx.send(FrameEvent::CloseRequested).unwrap();
        let stats = handle.join().unwrap();

        assert_eq!(stats.events, 1);
    }
}

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::time::{FrameClock, FrameTime};

/// Control directive returned by the tick callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickControl {
    Continue,
    Exit,
}

/// Per-tick contract driven by the scheduler's rendering thread.
///
/// `on_tick` runs once per tick; the next tick's wait begins only after it
/// returns, so invocations never overlap. `on_stop` runs on the same thread
/// after the loop exits (stop request or `TickControl::Exit`) and before the
/// thread terminates — resource teardown placed there stays thread-confined.
pub trait TickHandler: Send + 'static {
    fn on_tick(&mut self, time: FrameTime) -> TickControl;

    fn on_stop(&mut self) {}
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Target tick interval when nothing else paces the loop.
    pub cadence: Duration,

    /// Delta-time clamps forwarded to the loop's [`FrameClock`].
    pub dt_min: Duration,
    pub dt_max: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_micros(16_667), // ~60 Hz fallback
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }
}

/// Drives a repeating tick callback on a dedicated rendering thread.
///
/// Guarantees:
/// - ticks are totally ordered and never overlap;
/// - `start` while running is a no-op, `stop` while stopped is a no-op;
/// - after `stop` returns, no callback is in progress or pending — the
///   thread has been joined;
/// - `stop` interrupts an in-progress tick wait promptly instead of letting
///   it run out the full cadence interval.
pub struct FrameScheduler {
    config: SchedulerConfig,
    shared: Arc<SchedulerShared>,
    worker: Option<JoinHandle<()>>,
}

struct SchedulerShared {
    stop: Mutex<bool>,
    wake: Condvar,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(SchedulerShared {
                stop: Mutex::new(false),
                wake: Condvar::new(),
            }),
            worker: None,
        }
    }

    /// Whether the rendering thread is currently alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Begins delivering ticks to `handler`; returns immediately.
    ///
    /// Returns `false` without side effects when already running. A thread
    /// that exited on its own (via `TickControl::Exit`) is reaped first, so
    /// a stopped scheduler is always restartable.
    pub fn start<H: TickHandler>(&mut self, handler: H) -> bool {
        if let Some(h) = &self.worker {
            if !h.is_finished() {
                return false;
            }
        }
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }

        *self.shared.stop.lock().unwrap() = false;

        let shared = self.shared.clone();
        let config = self.config.clone();
        let worker = thread::Builder::new()
            .name("courtside-render".into())
            .spawn(move || run_loop(&shared, &config, handler))
            .expect("failed to spawn rendering thread");

        self.worker = Some(worker);
        true
    }

    /// Ceases tick delivery and joins the rendering thread.
    ///
    /// Blocks until the current tick (if any) completes and the handler's
    /// `on_stop` has run. Idempotent.
    pub fn stop(&mut self) {
        {
            let mut stop = self.shared.stop.lock().unwrap();
            *stop = true;
        }
        self.shared.wake.notify_all();

        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<H: TickHandler>(shared: &SchedulerShared, config: &SchedulerConfig, mut handler: H) {
    let mut clock = FrameClock::with_clamps(config.dt_min, config.dt_max);

    'ticks: loop {
        if *shared.stop.lock().unwrap() {
            break;
        }

        let time = clock.tick();
        if handler.on_tick(time) == TickControl::Exit {
            break;
        }

        // Wait out the rest of the cadence interval, or leave early on stop.
        let deadline = time.now + config.cadence;
        let mut stop = shared.stop.lock().unwrap();
        loop {
            if *stop {
                break 'ticks;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = shared
                .wake
                .wait_timeout(stop, deadline - now)
                .expect("scheduler mutex poisoned");
            stop = guard;
        }
        drop(stop);
    }

    handler.on_stop();
}

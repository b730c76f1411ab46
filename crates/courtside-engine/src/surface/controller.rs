use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::sched::{FrameScheduler, SchedulerConfig, TickControl, TickHandler};
use crate::scene::SceneSource;
use crate::time::FrameTime;

use super::driver::SurfaceDriver;
use super::events::{LifecycleState, SurfaceEvent, SurfaceObserver};

/// Requests routed from the host thread to the rendering thread.
///
/// Drained at the top of each tick, so a request always takes effect before
/// the next frame render and never mid-frame.
enum SurfaceCommand {
    Resize(u32, u32),
}

struct ControllerShared {
    state: Mutex<LifecycleState>,
    state_changed: Condvar,
    commands: Mutex<Vec<SurfaceCommand>>,
    observer: Mutex<Option<Arc<dyn SurfaceObserver>>>,
}

impl ControllerShared {
    fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.lock().unwrap();
        if *state != next {
            log::debug!("surface lifecycle: {:?} -> {:?}", *state, next);
            *state = next;
        }
        drop(state);
        self.state_changed.notify_all();
    }

    fn drain_commands(&self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }

    fn emit(&self, event: SurfaceEvent) {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            observer.on_event(&event);
        }
    }
}

/// Lifecycle controller for one embedded render surface.
///
/// Owns the frame scheduler and (through a [`SurfaceDriver`]) the GPU
/// resources of a single drawable. The host's UI thread calls the methods
/// here; GPU work happens exclusively on the rendering thread the scheduler
/// drives.
///
/// State machine: `Idle → Starting → Running → Stopping → Idle`,
/// re-enterable. `start_rendering` and `stop_rendering` are idempotent and
/// safe to call at arbitrary times. `stop_rendering` is a bounded
/// synchronous handshake — when it returns, no GPU work is in flight and
/// the drawable may be destroyed immediately.
pub struct SurfaceController {
    shared: Arc<ControllerShared>,
    scheduler: FrameScheduler,
    driver: Arc<Mutex<dyn SurfaceDriver>>,
    scene: Arc<Mutex<dyn SceneSource>>,
    drawable_size: (u32, u32),
}

impl SurfaceController {
    /// Creates a controller for a drawable currently sized `drawable_size`.
    ///
    /// The driver and scene source are handed to the rendering thread on
    /// start; the controller keeps them across stop/start cycles.
    pub fn new(
        driver: impl SurfaceDriver + 'static,
        scene: impl SceneSource + 'static,
        drawable_size: (u32, u32),
    ) -> Self {
        Self::with_config(driver, scene, drawable_size, SchedulerConfig::default())
    }

    pub fn with_config(
        driver: impl SurfaceDriver + 'static,
        scene: impl SceneSource + 'static,
        drawable_size: (u32, u32),
        config: SchedulerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(ControllerShared {
                state: Mutex::new(LifecycleState::Idle),
                state_changed: Condvar::new(),
                commands: Mutex::new(Vec::new()),
                observer: Mutex::new(None),
            }),
            scheduler: FrameScheduler::new(config),
            driver: Arc::new(Mutex::new(driver)),
            scene: Arc::new(Mutex::new(scene)),
            drawable_size,
        }
    }

    /// Registers the host's out-of-band event observer.
    pub fn set_observer(&self, observer: Arc<dyn SurfaceObserver>) {
        *self.shared.observer.lock().unwrap() = Some(observer);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// Blocks until the controller reaches `state`, or `timeout` elapses.
    ///
    /// Returns whether the state was reached. This is the observable end of
    /// the start handshake: `start_rendering` itself is fire-and-forget.
    pub fn await_state(&self, state: LifecycleState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.shared.state.lock().unwrap();
        while *guard != state {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (g, _) = self
                .shared
                .state_changed
                .wait_timeout(guard, deadline - now)
                .unwrap();
            guard = g;
        }
        true
    }

    /// Begins the render loop.
    ///
    /// Idempotent: a no-op unless the controller is `Idle`. Errors (no GPU
    /// device, dead drawable) are reported through the observer as
    /// [`SurfaceEvent::StartFailed`], after which the controller is `Idle`
    /// again.
    pub fn start_rendering(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if *state != LifecycleState::Idle {
                log::debug!("start_rendering ignored in state {:?}", *state);
                return;
            }
            *state = LifecycleState::Starting;
        }
        self.shared.state_changed.notify_all();

        // Reap a worker that exited on its own (device loss, start failure).
        // State `Idle` guarantees that thread is past its last tick, so this
        // join is bounded.
        self.scheduler.stop();

        let worker = SurfaceWorker {
            shared: self.shared.clone(),
            driver: self.driver.clone(),
            scene: self.scene.clone(),
            start_size: self.drawable_size,
            opened: false,
            lost: false,
        };
        self.scheduler.start(worker);
    }

    /// Halts the render loop and releases the bound surface.
    ///
    /// Idempotent: a no-op when `Idle` or already `Stopping`. Blocks until
    /// the rendering thread has finished its current tick (if any), torn
    /// down the GPU side, and exited.
    pub fn stop_rendering(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            match *state {
                LifecycleState::Idle | LifecycleState::Stopping => return,
                LifecycleState::Starting | LifecycleState::Running => {
                    *state = LifecycleState::Stopping;
                }
            }
        }
        self.shared.state_changed.notify_all();

        self.scheduler.stop();

        // The worker settles `Idle` in its `on_stop`; if the thread died
        // without running it, settle here so the controller stays usable.
        let mut state = self.shared.state.lock().unwrap();
        if *state != LifecycleState::Idle {
            *state = LifecycleState::Idle;
            drop(state);
            self.shared.state_changed.notify_all();
        }
    }

    /// Routes a new drawable size to the rendering thread.
    ///
    /// Takes effect before the next frame render. A zero size pauses
    /// presentation (frames skip) without changing the lifecycle state; a
    /// later nonzero size resumes it — no stop/start cycle involved.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.drawable_size = (width, height);

        // Coalesce: only the newest size matters to the next frame.
        let mut commands = self.shared.commands.lock().unwrap();
        commands.retain(|c| !matches!(c, SurfaceCommand::Resize(..)));
        commands.push(SurfaceCommand::Resize(width, height));
    }

    /// Host-view teardown notification: forces a synchronous stop.
    ///
    /// After this returns the host may free the drawable.
    pub fn host_view_destroyed(&mut self) {
        self.stop_rendering();
    }
}

impl Drop for SurfaceController {
    fn drop(&mut self) {
        self.stop_rendering();
    }
}

/// The tick handler running on the rendering thread.
///
/// Owns the open/render/teardown sequencing; the controller only flips the
/// state machine and signals the scheduler.
struct SurfaceWorker {
    shared: Arc<ControllerShared>,
    driver: Arc<Mutex<dyn SurfaceDriver>>,
    scene: Arc<Mutex<dyn SceneSource>>,
    start_size: (u32, u32),
    opened: bool,
    lost: bool,
}

impl TickHandler for SurfaceWorker {
    fn on_tick(&mut self, _time: FrameTime) -> TickControl {
        if !self.opened {
            let (width, height) = self.start_size;
            let result = self.driver.lock().unwrap().open(width, height);
            match result {
                Ok(()) => {
                    self.opened = true;
                    {
                        let mut state = self.shared.state.lock().unwrap();
                        // A stop may already have raced in; leave it alone.
                        if *state == LifecycleState::Starting {
                            *state = LifecycleState::Running;
                        }
                    }
                    self.shared.state_changed.notify_all();
                    log::info!("render surface started ({width}x{height})");
                    self.shared.emit(SurfaceEvent::Started);
                }
                Err(err) => {
                    log::warn!("render surface start failed: {err}");
                    self.shared.emit(SurfaceEvent::StartFailed(err));
                    return TickControl::Exit;
                }
            }
        }

        for command in self.shared.drain_commands() {
            match command {
                SurfaceCommand::Resize(width, height) => {
                    self.driver.lock().unwrap().resize(width, height);
                }
            }
        }

        let snapshot = self.scene.lock().unwrap().current_snapshot();
        match self.driver.lock().unwrap().render(&snapshot) {
            crate::render::FrameStatus::Presented => TickControl::Continue,
            crate::render::FrameStatus::Skipped(reason) => {
                log::debug!("frame skipped: {reason:?}");
                TickControl::Continue
            }
            crate::render::FrameStatus::DeviceLost => {
                log::error!("GPU device lost; stopping render surface");
                self.lost = true;
                self.shared.emit(SurfaceEvent::DeviceLost);
                TickControl::Exit
            }
        }
    }

    fn on_stop(&mut self) {
        self.driver.lock().unwrap().close();

        if self.opened && !self.lost {
            self.shared.emit(SurfaceEvent::Stopped);
        }

        // Last act of the worker: the controller relies on `Idle` meaning
        // "the rendering thread is done with the driver".
        self.shared.set_state(LifecycleState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StartError;
    use crate::render::{FrameStatus, SkipReason};
    use crate::scene::SceneSnapshot;
    use std::sync::Weak;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::thread;

    /// Counters shared between a [`FakeDriver`] and the test body.
    #[derive(Default)]
    struct DriverLog {
        opens: AtomicU32,
        closes: AtomicU32,
        renders: AtomicU32,
        presented: AtomicU32,
        open: AtomicBool,
        size: Mutex<(u32, u32)>,
    }

    /// GPU-free driver with scriptable failure modes.
    struct FakeDriver {
        log: Arc<DriverLog>,
        fail_open: Option<StartError>,
        lose_after_presents: Option<u32>,
        drawable: Option<Weak<()>>,
    }

    impl FakeDriver {
        fn new(log: Arc<DriverLog>) -> Self {
            Self {
                log,
                fail_open: None,
                lose_after_presents: None,
                drawable: None,
            }
        }
    }

    impl SurfaceDriver for FakeDriver {
        fn open(&mut self, width: u32, height: u32) -> Result<(), StartError> {
            if let Some(err) = &self.fail_open {
                return Err(err.clone());
            }
            self.log.opens.fetch_add(1, Ordering::SeqCst);
            self.log.open.store(true, Ordering::SeqCst);
            *self.log.size.lock().unwrap() = (width, height);
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            *self.log.size.lock().unwrap() = (width, height);
        }

        fn render(&mut self, _scene: &SceneSnapshot) -> FrameStatus {
            self.log.renders.fetch_add(1, Ordering::SeqCst);

            if !self.log.open.load(Ordering::SeqCst) {
                return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
            }
            if let Some(weak) = &self.drawable {
                if weak.strong_count() == 0 {
                    return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
                }
            }
            let (w, h) = *self.log.size.lock().unwrap();
            if w == 0 || h == 0 {
                return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
            }
            if let Some(limit) = self.lose_after_presents {
                if self.log.presented.load(Ordering::SeqCst) >= limit {
                    return FrameStatus::DeviceLost;
                }
            }

            self.log.presented.fetch_add(1, Ordering::SeqCst);
            FrameStatus::Presented
        }

        fn close(&mut self) {
            self.log.open.store(false, Ordering::SeqCst);
            self.log.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StillScene;

    impl SceneSource for StillScene {
        fn current_snapshot(&mut self) -> SceneSnapshot {
            SceneSnapshot::empty()
        }
    }

    #[derive(Default)]
    struct RecordingObserver(Mutex<Vec<SurfaceEvent>>);

    impl RecordingObserver {
        fn events(&self) -> Vec<SurfaceEvent> {
            self.0.lock().unwrap().clone()
        }

        fn count(&self, event: &SurfaceEvent) -> usize {
            self.events().iter().filter(|e| *e == event).count()
        }
    }

    impl SurfaceObserver for RecordingObserver {
        fn on_event(&self, event: &SurfaceEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            cadence: Duration::from_millis(1),
            ..SchedulerConfig::default()
        }
    }

    fn wait_until(mut pred: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if pred() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        pred()
    }

    fn controller_with(driver: FakeDriver) -> (SurfaceController, Arc<RecordingObserver>) {
        let controller =
            SurfaceController::with_config(driver, StillScene, (400, 800), fast_config());
        let observer = Arc::new(RecordingObserver::default());
        controller.set_observer(observer.clone());
        (controller, observer)
    }

    const WAIT: Duration = Duration::from_secs(2);

    // ── start / stop ──────────────────────────────────────────────────────

    #[test]
    fn start_reaches_running_and_presents() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) >= 1,
            WAIT
        ));

        assert_eq!(*log.size.lock().unwrap(), (400, 800));
        assert_eq!(observer.count(&SurfaceEvent::Started), 1);

        controller.stop_rendering();
    }

    #[test]
    fn stop_returns_to_idle_and_halts_rendering() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) >= 1,
            WAIT
        ));

        controller.stop_rendering();
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);

        // No render may happen after stop has returned.
        let renders_at_stop = log.renders.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(log.renders.load(Ordering::SeqCst), renders_at_stop);

        assert_eq!(observer.events().last(), Some(&SurfaceEvent::Stopped));
    }

    #[test]
    fn start_twice_keeps_a_single_worker() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        controller.start_rendering();

        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) >= 2,
            WAIT
        ));
        assert_eq!(log.opens.load(Ordering::SeqCst), 1);

        controller.stop_rendering();
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_when_idle_is_a_noop() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, observer) = controller_with(FakeDriver::new(log.clone()));

        controller.stop_rendering();
        controller.stop_rendering();

        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(log.closes.load(Ordering::SeqCst), 0);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn start_stop_storm_settles_idle() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        for _ in 0..10 {
            controller.start_rendering();
            controller.stop_rendering();
        }

        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(!log.open.load(Ordering::SeqCst));
        // Every cycle closes; a stop that outran its open closes without one.
        assert!(log.closes.load(Ordering::SeqCst) >= log.opens.load(Ordering::SeqCst));

        let renders_at_rest = log.renders.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(log.renders.load(Ordering::SeqCst), renders_at_rest);
    }

    // ── start failure ─────────────────────────────────────────────────────

    #[test]
    fn start_failure_reports_and_returns_to_idle() {
        let log = Arc::new(DriverLog::default());
        let mut driver = FakeDriver::new(log.clone());
        driver.fail_open = Some(StartError::DeviceUnavailable("no adapter".into()));
        let (mut controller, observer) = controller_with(driver);

        controller.start_rendering();

        assert!(wait_until(
            || {
                observer.count(&SurfaceEvent::StartFailed(StartError::DeviceUnavailable(
                    "no adapter".into(),
                ))) == 1
            },
            WAIT
        ));
        assert!(controller.await_state(LifecycleState::Idle, WAIT));

        assert_eq!(log.opens.load(Ordering::SeqCst), 0);
        assert_eq!(observer.count(&SurfaceEvent::Started), 0);
        assert_eq!(observer.count(&SurfaceEvent::Stopped), 0);
    }

    // ── device loss ───────────────────────────────────────────────────────

    #[test]
    fn device_loss_tears_down_and_notifies_once() {
        let log = Arc::new(DriverLog::default());
        let mut driver = FakeDriver::new(log.clone());
        driver.lose_after_presents = Some(2);
        let (mut controller, observer) = controller_with(driver);

        controller.start_rendering();
        assert!(wait_until(
            || observer.count(&SurfaceEvent::DeviceLost) >= 1,
            WAIT
        ));
        assert!(controller.await_state(LifecycleState::Idle, WAIT));

        assert_eq!(observer.count(&SurfaceEvent::DeviceLost), 1);
        assert_eq!(observer.count(&SurfaceEvent::Stopped), 0);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
        assert!(!log.open.load(Ordering::SeqCst));

        // The host may retry after device loss. The fake loses the device
        // again immediately, so only the re-open is asserted.
        controller.start_rendering();
        assert!(wait_until(
            || log.opens.load(Ordering::SeqCst) == 2,
            WAIT
        ));
        controller.stop_rendering();
    }

    // ── teardown race ─────────────────────────────────────────────────────

    #[test]
    fn stop_then_destroy_drawable_never_renders_it() {
        let drawable = Arc::new(());
        let log = Arc::new(DriverLog::default());
        let mut driver = FakeDriver::new(log.clone());
        driver.drawable = Some(Arc::downgrade(&drawable));
        let (mut controller, _observer) = controller_with(driver);

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) >= 1,
            WAIT
        ));

        controller.stop_rendering();
        drop(drawable);

        let renders_at_stop = log.renders.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(log.renders.load(Ordering::SeqCst), renders_at_stop);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_to_zero_pauses_and_nonzero_resumes() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) >= 1,
            WAIT
        ));

        controller.resize(0, 0);
        assert!(wait_until(|| *log.size.lock().unwrap() == (0, 0), WAIT));

        // Ticks keep coming but nothing presents at zero size.
        let presented_at_pause = log.presented.load(Ordering::SeqCst);
        let renders_at_pause = log.renders.load(Ordering::SeqCst);
        assert!(wait_until(
            || log.renders.load(Ordering::SeqCst) >= renders_at_pause + 3,
            WAIT
        ));
        assert_eq!(log.presented.load(Ordering::SeqCst), presented_at_pause);
        assert_eq!(controller.state(), LifecycleState::Running);

        // A real size resumes presentation without a stop/start cycle.
        controller.resize(400, 800);
        assert!(wait_until(
            || log.presented.load(Ordering::SeqCst) > presented_at_pause,
            WAIT
        ));
        assert_eq!(controller.state(), LifecycleState::Running);
        assert_eq!(log.opens.load(Ordering::SeqCst), 1);

        controller.stop_rendering();
    }

    #[test]
    fn resize_while_idle_applies_on_next_start() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        controller.resize(1024, 768);
        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        assert!(wait_until(|| *log.size.lock().unwrap() == (1024, 768), WAIT));

        controller.stop_rendering();
    }

    // ── destruction ───────────────────────────────────────────────────────

    #[test]
    fn host_view_destroyed_forces_stop() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));

        controller.host_view_destroyed();
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(!log.open.load(Ordering::SeqCst));
    }

    #[test]
    fn drop_while_running_stops_cleanly() {
        let log = Arc::new(DriverLog::default());
        let (mut controller, _observer) = controller_with(FakeDriver::new(log.clone()));

        controller.start_rendering();
        assert!(controller.await_state(LifecycleState::Running, WAIT));
        drop(controller);

        assert!(!log.open.load(Ordering::SeqCst));
        let renders_at_drop = log.renders.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(log.renders.load(Ordering::SeqCst), renders_at_drop);
    }

    // ── await_state ───────────────────────────────────────────────────────

    #[test]
    fn await_state_times_out_when_state_never_comes() {
        let log = Arc::new(DriverLog::default());
        let (controller, _observer) = controller_with(FakeDriver::new(log));

        let begun = Instant::now();
        assert!(!controller.await_state(LifecycleState::Running, Duration::from_millis(50)));
        assert!(begun.elapsed() >= Duration::from_millis(50));
    }
}

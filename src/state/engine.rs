//! Countdown engine: the state machine plus its single live sampler

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{
    clock::{Clock, SystemClock},
    countdown::{CountdownError, CountdownState, DisplaySnapshot, Phase},
};
use crate::tasks::sampler::{spawn_sampler, SamplerHandle, TickOutcome};

/// Shortest accepted sampler interval
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct EngineInner {
    state: CountdownState,
    sampler: Option<SamplerHandle>,
    next_generation: u64,
    display_tx: watch::Sender<DisplaySnapshot>,
}

impl EngineInner {
    fn publish(&self) {
        // send_replace never fails, even with no receivers
        self.display_tx.send_replace(self.state.snapshot());
    }

    fn cancel_sampler(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.cancel();
        }
    }

    /// Sample the clock; stops the sampler once the countdown expires
    fn refresh(&mut self, now: i64) {
        if !self.state.is_running() {
            return;
        }
        if self.state.sample(now) != Phase::Running {
            self.cancel_sampler();
        }
        self.publish();
    }
}

/// Owns the countdown state and guarantees at most one sampler is live
///
/// Operator actions are synchronous; while running, a tokio task samples
/// the clock every `tick_interval` and publishes a [`DisplaySnapshot`]
/// through a watch channel.
pub struct CountdownEngine {
    inner: Arc<Mutex<EngineInner>>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl CountdownEngine {
    /// Create an idle engine with the given duration
    pub fn new(total_seconds: u64, tick_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let state = CountdownState::new(total_seconds);
        let (display_tx, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                state,
                sampler: None,
                next_generation: 1,
                display_tx,
            })),
            clock,
            tick_interval: tick_interval.max(MIN_TICK_INTERVAL),
        }
    }

    /// Create an engine driven by the system wall clock
    pub fn with_system_clock(total_seconds: u64, tick_interval: Duration) -> Self {
        Self::new(total_seconds, tick_interval, Arc::new(SystemClock))
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Subscribe to display updates; the receiver starts at the current value
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.lock().display_tx.subscribe()
    }

    /// Current display values, freshly sampled when running
    pub fn snapshot(&self) -> DisplaySnapshot {
        let mut inner = self.lock();
        inner.refresh(self.clock.now_millis());
        inner.state.snapshot()
    }

    /// Set a new duration in minutes
    ///
    /// # Errors
    ///
    /// See [`CountdownState::configure`].
    pub fn configure(&self, minutes: f64) -> Result<DisplaySnapshot, CountdownError> {
        let mut inner = self.lock();
        inner.refresh(self.clock.now_millis());
        inner.state.configure(minutes)?;
        inner.cancel_sampler();
        inner.publish();
        Ok(inner.state.snapshot())
    }

    /// Start counting down, replacing any live sampler
    ///
    /// # Errors
    ///
    /// `NothingToStart` when the remaining time is zero.
    pub fn start(&self) -> Result<DisplaySnapshot, CountdownError> {
        let mut inner = self.lock();
        let now = self.clock.now_millis();
        inner.refresh(now);
        inner.state.start(now)?;
        self.arm_sampler(&mut inner);
        inner.publish();
        Ok(inner.state.snapshot())
    }

    /// Pause a running countdown; otherwise a no-op
    pub fn pause(&self) -> DisplaySnapshot {
        let mut inner = self.lock();
        if inner.state.pause(self.clock.now_millis()) {
            inner.cancel_sampler();
            inner.publish();
        }
        inner.state.snapshot()
    }

    /// Resume a paused countdown; otherwise a no-op
    pub fn resume(&self) -> DisplaySnapshot {
        let mut inner = self.lock();
        if inner.state.resume(self.clock.now_millis()) {
            self.arm_sampler(&mut inner);
            inner.publish();
        }
        inner.state.snapshot()
    }

    /// Zero the countdown from any phase
    pub fn reset(&self) -> DisplaySnapshot {
        let mut inner = self.lock();
        inner.cancel_sampler();
        inner.state.reset();
        inner.publish();
        inner.state.snapshot()
    }

    /// Release the sampler; safe to call repeatedly
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if inner.sampler.is_some() {
            info!("Stopping countdown sampler");
        }
        inner.cancel_sampler();
    }

    pub fn phase(&self) -> Phase {
        self.lock().state.phase()
    }

    /// Generation of the live sampler, if any
    pub fn sampler_generation(&self) -> Option<u64> {
        self.lock().sampler.as_ref().map(SamplerHandle::generation)
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        lock_inner(&self.inner)
    }

    fn arm_sampler(&self, inner: &mut EngineInner) {
        inner.cancel_sampler();

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let weak = Arc::downgrade(&self.inner);
        let clock = Arc::clone(&self.clock);
        inner.sampler = Some(spawn_sampler(generation, self.tick_interval, move || {
            run_tick(&weak, &*clock, generation)
        }));
        debug!("Armed sampler generation {}", generation);
    }
}

impl fmt::Debug for CountdownEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownEngine")
            .field("tick_interval", &self.tick_interval)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        lock_inner(&self.inner).cancel_sampler();
    }
}

fn lock_inner(inner: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    // every critical section leaves the state consistent, so a poisoned lock is still usable
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One sampler tick; stale generations publish nothing
fn run_tick(weak: &Weak<Mutex<EngineInner>>, clock: &dyn Clock, generation: u64) -> TickOutcome {
    let Some(shared) = weak.upgrade() else {
        return TickOutcome::Stop;
    };
    let mut inner = lock_inner(&shared);

    let current = inner.sampler.as_ref().map(SamplerHandle::generation);
    if current != Some(generation) {
        debug!("Dropping stale tick from sampler generation {}", generation);
        return TickOutcome::Stop;
    }

    inner.refresh(clock.now_millis());
    debug!(
        "Tick: {}s remaining ({})",
        inner.state.remaining_seconds(),
        inner.state.phase().as_str()
    );

    if inner.state.is_running() {
        TickOutcome::Continue
    } else {
        TickOutcome::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::ManualClock;

    const T0: i64 = 1_700_000_000_000;
    const TICK: Duration = Duration::from_millis(250);

    fn engine(total_seconds: u64) -> (CountdownEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let engine = CountdownEngine::new(total_seconds, TICK, clock.clone());
        (engine, clock)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    /// Move both the engine clock and tokio's paused timer forward by one tick
    async fn tick(clock: &ManualClock, millis: i64) {
        clock.advance_millis(millis);
        tokio::time::advance(Duration::from_millis(millis as u64)).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_publishes_until_expired() {
        let (engine, clock) = engine(3);
        let rx = engine.subscribe();

        engine.start().unwrap();
        settle().await;
        assert_eq!(engine.sampler_generation(), Some(1));

        for _ in 0..(3 * 1000 / 250) {
            tick(&clock, 250).await;
        }

        let published = rx.borrow().clone();
        assert_eq!(published.remaining_seconds, 0);
        assert_eq!(published.phase, Phase::Expired);
        assert_eq!(published.progress_fraction, 0.0);
        assert_eq!(engine.sampler_generation(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_quarter_scenario_through_sampler() {
        let (engine, clock) = engine(300);
        engine.configure(5.0).unwrap();
        let rx = engine.subscribe();

        engine.start().unwrap();
        settle().await;
        tick(&clock, 225_000).await;

        let published = rx.borrow().clone();
        assert_eq!(published.remaining_seconds, 75);
        assert!(published.is_in_final_quarter);
        assert_eq!(published.phase, Phase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_sampler() {
        let (engine, clock) = engine(60);
        let rx = engine.subscribe();

        engine.start().unwrap();
        settle().await;
        let snapshot = engine.reset();
        assert_eq!(snapshot.remaining_seconds, 0);
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(engine.sampler_generation(), None);

        for _ in 0..8 {
            tick(&clock, 250).await;
        }
        let published = rx.borrow().clone();
        assert_eq!(published.remaining_seconds, 0);
        assert_eq!(published.phase, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_gap_resume_keeps_remaining() {
        let (engine, clock) = engine(120);
        engine.start().unwrap();
        settle().await;
        tick(&clock, 30_000).await;

        let paused = engine.pause();
        assert_eq!(paused.phase, Phase::Paused);
        assert_eq!(paused.remaining_seconds, 90);
        assert_eq!(engine.sampler_generation(), None);

        clock.advance_millis(600_000);
        tokio::time::advance(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(engine.snapshot().remaining_seconds, 90);

        let resumed = engine.resume();
        assert_eq!(resumed.phase, Phase::Running);
        assert_eq!(resumed.remaining_seconds, 90);
        assert!(engine.sampler_generation().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_starts_leave_one_live_sampler() {
        let (engine, clock) = engine(60);
        let rx = engine.subscribe();

        engine.start().unwrap();
        engine.start().unwrap();
        assert_eq!(engine.sampler_generation(), Some(2));

        // a tick from the replaced sampler must not touch the state
        clock.advance_millis(10_000);
        let weak = Arc::downgrade(&engine.inner);
        assert_eq!(run_tick(&weak, &*clock, 1), TickOutcome::Stop);
        assert_eq!(rx.borrow().remaining_seconds, 60);
        assert_eq!(engine.sampler_generation(), Some(2));

        assert_eq!(run_tick(&weak, &*clock, 2), TickOutcome::Continue);
        assert_eq!(rx.borrow().remaining_seconds, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_reset_is_rejected() {
        let (engine, _clock) = engine(60);
        engine.reset();
        assert_eq!(engine.start(), Err(CountdownError::NothingToStart));
        assert_eq!(engine.sampler_generation(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_while_running_is_rejected() {
        let (engine, _clock) = engine(60);
        engine.start().unwrap();
        assert_eq!(engine.configure(2.0), Err(CountdownError::StillRunning));
        assert_eq!(engine.phase(), Phase::Running);
        assert!(engine.sampler_generation().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let (engine, _clock) = engine(60);
        engine.start().unwrap();
        engine.shutdown();
        engine.shutdown();
        assert_eq!(engine.sampler_generation(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_mid_run_stops_ticks() {
        let (engine, _clock) = engine(60);
        engine.start().unwrap();
        let weak = Arc::downgrade(&engine.inner);
        drop(engine);

        assert!(weak.upgrade().is_none());
        let clock = ManualClock::new(T0);
        assert_eq!(run_tick(&weak, &clock, 1), TickOutcome::Stop);
    }

    #[test]
    fn test_tick_interval_is_clamped() {
        let engine = CountdownEngine::with_system_clock(60, Duration::from_millis(1));
        assert_eq!(engine.tick_interval(), MIN_TICK_INTERVAL);
    }
}

//! Periodic display sampler task

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

/// What the sampler should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Handle to the one live sampler task
///
/// Dropping the handle aborts the task, so replacing it in an `Option`
/// cancels the previous sampler.
#[derive(Debug)]
pub struct SamplerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the task; a no-op when it already stopped
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        debug!("Cancelling sampler generation {}", self.generation);
        self.task.abort();
    }
}

/// Spawn a sampler that calls `on_tick` every `period` until it returns `Stop`
///
/// The first tick fires immediately. Ticks that fall behind are skipped
/// rather than bunched up.
pub fn spawn_sampler<F>(generation: u64, period: Duration, mut on_tick: F) -> SamplerHandle
where
    F: FnMut() -> TickOutcome + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if on_tick() == TickOutcome::Stop {
                debug!("Sampler generation {} stopped", generation);
                break;
            }
        }
    });

    SamplerHandle { generation, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_ticks_until_stop() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let handle = spawn_sampler(1, Duration::from_millis(250), move || {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                TickOutcome::Stop
            } else {
                TickOutcome::Continue
            }
        });

        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(250)).await;
            settle().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
        assert_eq!(handle.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sampler_never_ticks_again() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let handle = spawn_sampler(7, Duration::from_millis(250), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickOutcome::Continue
        });

        settle().await;
        let before = count.load(Ordering::SeqCst);
        handle.cancel();

        for _ in 0..4 {
            tokio::time::advance(Duration::from_millis(250)).await;
            settle().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), before);
    }
}

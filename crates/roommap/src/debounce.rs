use std::{future::Future, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle};

/// A single resettable timer.
///
/// Every [`Debouncer::schedule`] call aborts the pending timer and starts a new one, so only the
/// last call within `delay` fires. Each timer carries a generation number; a fire that raced a
/// newer `schedule` can be recognised with [`Debouncer::is_current`] and ignored.
///
/// The timer future should only notify, never do the actual work, since aborting it drops
/// whatever it was awaiting.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resets the timer. `fire` receives the generation of this timer and produces the future to
    /// run once `delay` has passed without another call.
    pub fn schedule<F, Fut>(&mut self, runtime: &Handle, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let delay = self.delay;
        let fut = fire(self.generation);
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        }));

        self.generation
    }

    /// Drops the pending timer, if any. Later fires of older generations are stale.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

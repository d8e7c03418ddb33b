//! Detached side effects that must never hold up a response.
//!
//! Email delivery and conversion tracking are spawned here. The redirect is
//! returned without waiting for them; shutdown (and tests) call `drain`.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinSet;
use tracing::Instrument;

/// A shared set of fire-and-forget tasks.
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        // A panic while holding the lock cannot leave the set inconsistent.
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns `task` on the current runtime under a `background` span.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock();
        while let Some(finished) = tasks.try_join_next() {
            log_join_error(finished);
        }
        tasks.spawn(task.instrument(tracing::info_span!("background", task = name)));
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for every spawned task, including tasks spawned while draining.
    /// Returns how many tasks were awaited.
    pub async fn drain(&self) -> usize {
        let mut drained = 0;
        loop {
            let mut pending = std::mem::take(&mut *self.lock());
            if pending.is_empty() {
                return drained;
            }
            while let Some(finished) = pending.join_next().await {
                log_join_error(finished);
                drained += 1;
            }
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        if err.is_panic() {
            tracing::error!(error = %err, "background task panicked");
        } else {
            tracing::warn!(error = %err, "background task cancelled");
        }
    }
}

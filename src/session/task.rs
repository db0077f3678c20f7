use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};

/// Cancellable periodic task. Dropping it stops the ticking.
#[derive(Debug)]
pub struct PeriodicTask {
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Calls `tick` every `period`, starting one period from now, until it returns `false`.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;
                if !tick() {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

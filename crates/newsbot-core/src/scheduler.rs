//! Periodic trigger for the digest cycle.
//!
//! Runs once at startup, then every `interval` until cancelled. A tick that
//! lands while a manual run is in flight is skipped, not queued.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{cycle::DigestCycle, delivery::progress::LogProgress, errors::Error};

pub struct PeriodicScheduler {
    cycle: Arc<DigestCycle>,
    interval: Duration,
}

impl PeriodicScheduler {
    pub fn new(cycle: Arc<DigestCycle>, interval: Duration) -> Self {
        Self { cycle, interval }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!(every_secs = self.interval.as_secs(), "periodic digest started");
        loop {
            self.tick().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }
        info!("periodic digest stopped");
    }

    async fn tick(&self) {
        // Other failures are logged and recorded by the cycle itself.
        if let Err(Error::Busy) = self.cycle.run(&LogProgress).await {
            info!("digest already running, skipping this tick");
        }
    }
}

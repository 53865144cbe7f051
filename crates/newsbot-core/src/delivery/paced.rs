use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    delivery::{port::DeliveryPort, types::DeliveryCapabilities},
    domain::MessageContainer,
    Result,
};

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// DeliveryPort decorator that spaces sends by a fixed interval.
///
/// Keeps consecutive pages under the channel's burst-rate policy. The first
/// send goes out immediately.
pub struct PacedDelivery {
    inner: Arc<dyn DeliveryPort>,
    limiter: Mutex<IntervalLimiter>,
}

impl PacedDelivery {
    pub fn new(inner: Arc<dyn DeliveryPort>, interval: Duration) -> Self {
        Self {
            inner,
            limiter: Mutex::new(IntervalLimiter::new(interval)),
        }
    }

    async fn pace(&self) {
        let wait = { self.limiter.lock().await.reserve() };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl DeliveryPort for PacedDelivery {
    fn capabilities(&self) -> DeliveryCapabilities {
        self.inner.capabilities()
    }

    async fn send(&self, container: &MessageContainer) -> Result<()> {
        self.pace().await;
        self.inner.send(container).await
    }
}

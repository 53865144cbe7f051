use async_trait::async_trait;
use tracing::info;

/// Where a cycle echoes its progress ("checking", "found N", "error: ...").
///
/// Best-effort: a requester that cannot be reached never fails the cycle.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, text: &str);
}

/// Progress sink for the periodic trigger: log only, nobody to answer.
pub struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, text: &str) {
        info!("{text}");
    }
}

use async_trait::async_trait;

use crate::{delivery::types::DeliveryCapabilities, domain::MessageContainer, Result};

/// Cross-platform delivery port.
///
/// Discord and Telegram implement it in adapter crates; capabilities tell the
/// packer which markup to produce and which ceilings to respect.
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    fn capabilities(&self) -> DeliveryCapabilities;

    /// Send one page. `Ok` means the platform confirmed the message.
    async fn send(&self, container: &MessageContainer) -> Result<()>;
}

pub mod whatsapp;

use async_trait::async_trait;

/// Outbound delivery channel. An empty reply upstream means "send nothing",
/// so implementations can assume `body` is non-empty.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

use super::moderation_models::ModerationConfig;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable home of the moderation config. Whole-record reads and writes only.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    async fn read(&self) -> Result<Option<ModerationConfig>, StoreError>;
    /// Overwrite the stored record. Readers must never observe a partial write.
    async fn write(&self, config: &ModerationConfig) -> Result<(), StoreError>;
}

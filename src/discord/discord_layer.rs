// Discord layer - the transport adapter and event handlers.

use crate::core::moderation::ModerationService;
use crate::infra::moderation::JsonConfigStore;
use std::sync::Arc;

#[path = "moderation/mod.rs"]
pub mod moderation;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every framework callback.
#[derive(Clone)]
pub struct Data {
    pub moderation: Arc<ModerationService<JsonConfigStore>>,
}

// Core moderation module - group policy, warnings and admin commands.
// Platform-agnostic: the Discord layer only converts messages and runs actions.

pub mod actions;
pub mod commands;
pub mod config_store;
pub mod moderation_models;
pub mod moderation_service;
pub mod policy;
pub mod warning_ledger;

pub use actions::{ChatTransport, TransportError};
pub use config_store::{ConfigStore, StoreError};
pub use moderation_models::{ChatKind, IncomingMessage, ModerationConfig};
pub use moderation_service::ModerationService;

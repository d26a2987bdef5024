// File-backed persistence for the moderation config.

pub mod json_store;

pub use json_store::JsonConfigStore;

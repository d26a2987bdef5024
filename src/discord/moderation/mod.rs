// Discord-specific moderation glue.

pub mod events;
pub mod transport;

pub use transport::SerenityTransport;

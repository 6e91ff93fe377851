//! # chatlog-store
//!
//! Read-only access to an exported chat storage root: the contact database
//! at `Msg/MicroMsg.db` and the sharded message databases under
//! `Msg/Multi/`. The crate never writes to either.

pub mod contacts;
pub mod database;
pub mod messages;
pub mod models;

mod error;

pub use database::ChatStore;
pub use error::{Result, StoreError};
pub use models::ConversationSummary;

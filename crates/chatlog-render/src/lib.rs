//! # chatlog-render
//!
//! Turns raw message rows into transcript lines: canonical display text per
//! message type, speaker attribution for group chats, and assembly of the
//! ordered dialogue.

pub mod error;
pub mod render;
pub mod sender;
pub mod transcript;

pub use error::RenderError;
pub use render::ContentRenderer;
pub use sender::GroupSenderResolver;
pub use transcript::{format_timestamp, DialogueLine, Participants, Transcript, TranscriptBuilder};

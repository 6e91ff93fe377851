//! # chatlog-shared
//!
//! Message model, storage-layout constants, the diagnostics sink and the
//! decoder for the per-message binary extension blob. Everything here is
//! free of filesystem and database access.

pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod extension;
pub mod types;

pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink};
pub use error::DecodeError;
pub use extension::{decode_extension, encode_extension, ExtensionEntry, ExtensionHints};
pub use types::{ContactIdentity, MessageType, MiscSubtype, NicknameLookup, RawMessage};

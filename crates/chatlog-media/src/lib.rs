//! # chatlog-media
//!
//! Attachment handling: turning stored path hints into real files under the
//! storage root, content-addressed discovery by message server id, and
//! conversion of encrypted `.dat` image containers into ordinary images.

pub mod attachments;
pub mod error;
pub mod resolver;
pub mod transcode;

pub use attachments::{resolve_attachments, ResolvedAttachment};
pub use error::MediaError;
pub use resolver::{MediaKind, PathResolver, Resolution, StorageLayout};
pub use transcode::{
    CommandDecryptor, Decryptor, ImageFormat, Transcoder, UnavailableDecryptor,
};

//! Decoder for the per-message extension blob.
//!
//! The blob is a protobuf message: an optional header at tag 1 and a
//! repeated list of entries at tag 3, each entry holding a small integer
//! field id (tag 1) and a string payload (tag 2). Only the entries matter
//! here; unknown tags are skipped by prost.

use prost::Message;

use crate::constants::{FIELD_ATTACHMENT_PATH, FIELD_SENDER_ID, FIELD_THUMB_PATH};
use crate::diagnostics::DiagnosticSink;
use crate::error::DecodeError;

#[derive(Clone, PartialEq, Message)]
struct ExtraHeader {
    #[prost(int32, tag = "1")]
    field1: i32,
    #[prost(int32, tag = "2")]
    field2: i32,
}

#[derive(Clone, PartialEq, Message)]
struct ExtraEntry {
    #[prost(int32, tag = "1")]
    field_id: i32,
    /// Kept as raw bytes so one bad payload does not reject the whole blob.
    #[prost(bytes = "vec", tag = "2")]
    value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
struct MessageExtra {
    #[prost(message, optional, tag = "1")]
    header: Option<ExtraHeader>,
    #[prost(message, repeated, tag = "3")]
    entries: Vec<ExtraEntry>,
}

/// A decoded `(field id, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub field_id: i32,
    pub value: String,
}

impl ExtensionEntry {
    pub fn new(field_id: i32, value: impl Into<String>) -> Self {
        Self {
            field_id,
            value: value.into(),
        }
    }
}

/// Encode entries in the on-disk layout. Used to build fixtures.
pub fn encode_extension(entries: &[ExtensionEntry]) -> Vec<u8> {
    MessageExtra {
        header: Some(ExtraHeader {
            field1: 1,
            field2: 1,
        }),
        entries: entries
            .iter()
            .map(|e| ExtraEntry {
                field_id: e.field_id,
                value: e.value.as_bytes().to_vec(),
            })
            .collect(),
    }
    .encode_to_vec()
}

/// Parse a blob into its entries, failing on malformed input.
pub fn try_decode_extension(blob: &[u8]) -> Result<Vec<ExtensionEntry>, DecodeError> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }

    let extra = MessageExtra::decode(blob).map_err(|source| DecodeError::Malformed {
        len: blob.len(),
        source,
    })?;

    Ok(extra
        .entries
        .into_iter()
        .map(|e| ExtensionEntry {
            field_id: e.field_id,
            value: String::from_utf8_lossy(&e.value).into_owned(),
        })
        .collect())
}

/// Parse a blob into its entries. Malformed blobs are reported to `sink`
/// and yield no entries, so the message falls back to text-only rendering.
pub fn decode_extension(blob: &[u8], sink: &dyn DiagnosticSink) -> Vec<ExtensionEntry> {
    match try_decode_extension(blob) {
        Ok(entries) => entries,
        Err(e) => {
            let head = hex::encode(&blob[..blob.len().min(16)]);
            sink.warn(
                "extension_decode_failed",
                &[("error", e.to_string().as_str()), ("head", head.as_str())],
            );
            Vec::new()
        }
    }
}

/// Typed view over the entries that carry meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionHints {
    pub sender_id: Option<String>,
    pub thumb_path: Option<String>,
    pub attachment_path: Option<String>,
}

impl ExtensionHints {
    /// Later entries with the same field id override earlier ones; empty
    /// values are treated as absent.
    pub fn from_entries(entries: &[ExtensionEntry]) -> Self {
        let mut hints = Self::default();
        for entry in entries.iter().filter(|e| !e.value.is_empty()) {
            let slot = match entry.field_id {
                FIELD_SENDER_ID => &mut hints.sender_id,
                FIELD_THUMB_PATH => &mut hints.thumb_path,
                FIELD_ATTACHMENT_PATH => &mut hints.attachment_path,
                _ => continue,
            };
            *slot = Some(entry.value.clone());
        }
        hints
    }
}

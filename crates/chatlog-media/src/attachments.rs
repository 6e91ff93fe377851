use chatlog_shared::extension::ExtensionHints;
use chatlog_shared::{MessageType, MiscSubtype, RawMessage};

use crate::resolver::{PathResolver, Resolution};

/// Attachment paths recovered for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub thumb: Resolution,
    pub image: Resolution,
    pub video: Resolution,
    pub voice: Resolution,
    pub file: Resolution,
    /// Display name of a transferred file, taken from the stored hint.
    pub file_name: String,
}

/// Resolve the hints carried by `message` into attachment paths.
///
/// The thumbnail hint only applies to picture, video and app messages. The
/// primary hint is a file for app/file messages and an image-or-video path
/// for the other media types. Voice clips are located by server id.
pub fn resolve_attachments(
    resolver: &PathResolver,
    message: &RawMessage,
    hints: &ExtensionHints,
) -> ResolvedAttachment {
    let mut attachment = ResolvedAttachment::default();
    let kind = message.kind();
    let server_id = message.server_id.as_str();

    if let Some(thumb) = hints.thumb_path.as_deref() {
        if kind.carries_media_hint() {
            attachment.thumb = resolver.resolve_or_guess(thumb, server_id);
        }
    }

    if let Some(hint) = hints.attachment_path.as_deref() {
        let is_file = kind == MessageType::Misc && message.misc_kind() == MiscSubtype::File;
        if is_file {
            attachment.file = resolver.resolve_or_guess(hint, server_id);
            attachment.file_name = hint_file_name(hint).to_string();
        } else if kind.carries_media_hint() {
            let resolved = resolver.resolve_or_guess(hint, server_id);
            attachment.image = resolved.clone();
            attachment.video = resolved;
        }
    }

    if kind == MessageType::Voice {
        attachment.voice = resolver.voice_clip(server_id);
    }

    attachment
}

/// Last component of a hint, whichever separator it uses.
fn hint_file_name(hint: &str) -> &str {
    hint.rsplit(['/', '\\']).next().unwrap_or(hint)
}

//! Canonical display text for every message type.
//!
//! Media lookups follow one order everywhere: paths verified from the
//! stored hints, then discovery by server id, then paths guessed from the
//! hints, then the bare tag. Only picture paths go through the
//! transcoder.

use std::path::{Path, PathBuf};

use chatlog_media::{MediaKind, PathResolver, Resolution, ResolvedAttachment, Transcoder};
use chatlog_shared::{MessageType, MiscSubtype, RawMessage};

pub struct ContentRenderer {
    resolver: PathResolver,
    transcoder: Transcoder,
}

impl ContentRenderer {
    pub fn new(resolver: PathResolver, transcoder: Transcoder) -> Self {
        Self {
            resolver,
            transcoder,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Render one message. Never fails; anything unrecognised yields the
    /// raw content.
    pub fn render(&self, message: &RawMessage, attachment: &ResolvedAttachment) -> String {
        let content = message.content.as_str();
        let server_id = message.server_id.as_str();

        match message.kind() {
            MessageType::Text => content.to_string(),
            MessageType::Picture => {
                let path = self
                    .media_path(
                        &[&attachment.image, &attachment.thumb],
                        MediaKind::Image,
                        server_id,
                    )
                    .map(|p| self.viewable(&p, server_id));
                tag("[Image]", &[shown(path.as_deref()).as_str()])
            }
            MessageType::Voice => {
                let path = attachment.voice.verified().map(Path::to_path_buf);
                tag("[Voice]", &[shown(path.as_deref()).as_str()])
            }
            MessageType::Video => {
                let path = self.media_path(
                    &[&attachment.video, &attachment.thumb],
                    MediaKind::Video,
                    server_id,
                );
                tag("[Video]", &[shown(path.as_deref()).as_str()])
            }
            MessageType::Emoji => {
                let path = self.discovered(MediaKind::Emoji, server_id);
                tag("[Emoji]", &[shown(path.as_deref()).as_str()])
            }
            MessageType::Location => tag("[Location]", &[content]),
            MessageType::Misc => self.render_misc(message, attachment),
            MessageType::Voip => "[Call]".to_string(),
            MessageType::System => tag("[System]", &[content]),
            MessageType::VisitCard | MessageType::Unknown(_) => content.to_string(),
        }
    }

    fn render_misc(&self, message: &RawMessage, attachment: &ResolvedAttachment) -> String {
        let content = message.content.as_str();
        let server_id = message.server_id.as_str();

        match message.misc_kind() {
            MiscSubtype::File => {
                let path = attachment
                    .file
                    .verified()
                    .map(Path::to_path_buf)
                    .or_else(|| {
                        self.resolver
                            .discover_file(server_id, &attachment.file_name)
                            .verified()
                            .map(Path::to_path_buf)
                    })
                    .or_else(|| attachment.file.guessed().map(Path::to_path_buf));
                tag(
                    "[File]",
                    &[attachment.file_name.as_str(), shown(path.as_deref()).as_str()],
                )
            }
            MiscSubtype::CustomEmoji | MiscSubtype::ShareEmoji => "[Custom Emoji]".to_string(),
            MiscSubtype::ForwardedMessage => {
                let path = self.media_path(&[&attachment.thumb], MediaKind::Forwarded, server_id);
                tag("[Forwarded]", &[content, shown(path.as_deref()).as_str()])
            }
            MiscSubtype::Applet | MiscSubtype::Applet2 => tag("[Mini-App]", &[content]),
            MiscSubtype::Channel | MiscSubtype::Live | MiscSubtype::Live2 => {
                let path =
                    self.media_path(&[&attachment.thumb], MediaKind::ChannelPost, server_id);
                tag("[Channel]", &[content, shown(path.as_deref()).as_str()])
            }
            MiscSubtype::Game => tag("[Game]", &[content]),
            MiscSubtype::Transfer => tag("[Transfer]", &[content]),
            MiscSubtype::RedPacket => tag("[Gift Money]", &[content]),
            MiscSubtype::Refer
            | MiscSubtype::Notice
            | MiscSubtype::Listen
            | MiscSubtype::Unknown(_) => content.to_string(),
        }
    }

    fn media_path(
        &self,
        candidates: &[&Resolution],
        kind: MediaKind,
        server_id: &str,
    ) -> Option<PathBuf> {
        candidates
            .iter()
            .find_map(|r| r.verified())
            .map(Path::to_path_buf)
            .or_else(|| self.discovered(kind, server_id))
            .or_else(|| {
                candidates
                    .iter()
                    .find_map(|r| r.guessed())
                    .map(Path::to_path_buf)
            })
    }

    fn discovered(&self, kind: MediaKind, server_id: &str) -> Option<PathBuf> {
        match self.resolver.discover(kind, server_id) {
            Resolution::Resolved(path) => Some(path),
            _ => None,
        }
    }

    fn viewable(&self, path: &Path, server_id: &str) -> PathBuf {
        self.transcoder.to_viewable(path, server_id)
    }
}

fn shown(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// `label` followed by the non-empty parts, single-space separated.
fn tag(label: &str, parts: &[&str]) -> String {
    let mut out = label.to_string();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        out.push(' ');
        out.push_str(part);
    }
    out
}

//! Speaker attribution for chatroom messages.
//!
//! The embedded sender id from the extension blob is authoritative. When it
//! is missing, the content is scanned for a `Name: text` prefix or an
//! `@Name` mention. If both fail the conversation's own display name is
//! used, which is approximate in busy rooms.

use std::sync::Arc;

use chatlog_shared::{DiagnosticSink, NicknameLookup, RawMessage};

/// Substrings that mark a candidate as a system notice rather than a name.
/// The first two appear verbatim in stored notices (system message and
/// message recall); the English pair covers exports from English-locale
/// clients.
const NOTICE_MARKERS: [&str; 4] = ["系统消息", "撤回了一条消息", "System Notice", "recalled a message"];

struct Heuristic {
    name: &'static str,
    run: fn(&str) -> Option<&str>,
}

const HEURISTICS: [Heuristic; 2] = [
    Heuristic {
        name: "colon_prefix",
        run: colon_prefix,
    },
    Heuristic {
        name: "at_mention",
        run: at_mention,
    },
];

pub struct GroupSenderResolver<'a> {
    lookup: &'a dyn NicknameLookup,
    sink: Arc<dyn DiagnosticSink>,
}

impl<'a> GroupSenderResolver<'a> {
    pub fn new(lookup: &'a dyn NicknameLookup, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { lookup, sink }
    }

    /// Display name of the author of `message`.
    ///
    /// `embedded_sender` is the decoded sender id; it is ignored for
    /// non-chatroom messages.
    pub fn resolve_sender(
        &self,
        message: &RawMessage,
        embedded_sender: Option<&str>,
        is_local_author: bool,
        local_name: &str,
        conversation_name: &str,
    ) -> String {
        if is_local_author {
            return local_name.to_string();
        }

        if let Some(account) = embedded_sender.filter(|_| message.is_chatroom()) {
            return match self.lookup.nickname(account) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    self.sink
                        .warn("sender_lookup_failed", &[("account", account)]);
                    account.to_string()
                }
            };
        }

        for heuristic in &HEURISTICS {
            if let Some(name) = (heuristic.run)(&message.content) {
                self.sink.debug(
                    "sender_guessed",
                    &[("heuristic", heuristic.name), ("name", name)],
                );
                return name.to_string();
            }
        }

        self.sink.debug(
            "sender_unresolved",
            &[
                ("server_id", message.server_id.as_str()),
                ("fallback", conversation_name),
            ],
        );
        conversation_name.to_string()
    }
}

/// `Name: text` where the colon sits within the first 50 bytes.
fn colon_prefix(text: &str) -> Option<&str> {
    let idx = text.find(':')?;
    if idx == 0 || idx >= 50 {
        return None;
    }
    accept(text[..idx].trim(), 30)
}

/// `... @Name ...` terminated by a space or newline.
fn at_mention(text: &str) -> Option<&str> {
    let at = text.find('@')?;
    let after = &text[at + 1..];
    let end = after.find([' ', '\n'])?;
    if end == 0 {
        return None;
    }
    accept(after[..end].trim(), 50)
}

fn accept(candidate: &str, max_len: usize) -> Option<&str> {
    let looks_like_notice = candidate.contains('[')
        || candidate.contains(']')
        || NOTICE_MARKERS.iter().any(|m| candidate.contains(m));
    let len_ok = !candidate.is_empty() && candidate.len() < max_len;
    (!looks_like_notice && len_ok).then_some(candidate)
}

use std::fmt::Display;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use chatlog_media::resolve_attachments;
use chatlog_shared::constants::TIME_FORMAT;
use chatlog_shared::{
    decode_extension, ContactIdentity, DiagnosticSink, ExtensionHints, NicknameLookup, RawMessage,
};

use crate::error::RenderError;
use crate::render::ContentRenderer;
use crate::sender::GroupSenderResolver;

// ---------------------------------------------------------------------------
// Output documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// 1-based position in the conversation.
    pub index: usize,
    pub speaker: String,
    pub text: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub instruction: String,
    pub dialogue: Vec<DialogueLine>,
}

impl Transcript {
    pub fn first_time(&self) -> Option<&str> {
        self.dialogue.first().map(|l| l.time.as_str())
    }

    pub fn last_time(&self) -> Option<&str> {
        self.dialogue.last().map(|l| l.time.as_str())
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// The two sides of a conversation. For chatrooms the counterpart is the
/// room itself.
#[derive(Debug, Clone)]
pub struct Participants {
    pub local: ContactIdentity,
    pub counterpart: ContactIdentity,
}

pub struct TranscriptBuilder<'a> {
    renderer: &'a ContentRenderer,
    senders: GroupSenderResolver<'a>,
    sink: Arc<dyn DiagnosticSink>,
    participants: Participants,
}

impl<'a> TranscriptBuilder<'a> {
    pub fn new(
        renderer: &'a ContentRenderer,
        lookup: &'a dyn NicknameLookup,
        sink: Arc<dyn DiagnosticSink>,
        participants: Participants,
    ) -> Self {
        Self {
            renderer,
            senders: GroupSenderResolver::new(lookup, sink.clone()),
            sink,
            participants,
        }
    }

    /// Build the transcript for `messages`, which must already be in
    /// ascending creation-time order.
    pub fn build(&self, messages: &[RawMessage]) -> Result<Transcript, RenderError> {
        if messages.is_empty() {
            return Err(RenderError::NoMessages(
                self.participants.counterpart.account_id.clone(),
            ));
        }

        let dialogue = messages
            .iter()
            .enumerate()
            .map(|(i, message)| self.line(i + 1, message))
            .collect();

        Ok(Transcript {
            instruction: format!(
                "Chat history with {}",
                self.participants.counterpart.display_name()
            ),
            dialogue,
        })
    }

    fn line(&self, index: usize, message: &RawMessage) -> DialogueLine {
        let entries = decode_extension(&message.extra, self.sink.as_ref());
        let hints = ExtensionHints::from_entries(&entries);
        let attachment = resolve_attachments(self.renderer.resolver(), message, &hints);

        DialogueLine {
            index,
            speaker: self.speaker(message, &hints),
            text: self.renderer.render(message, &attachment),
            time: format_timestamp(message.create_time),
        }
    }

    fn speaker(&self, message: &RawMessage, hints: &ExtensionHints) -> String {
        let local = self.participants.local.display_name();
        let counterpart = self.participants.counterpart.display_name();

        if message.is_chatroom() {
            self.senders.resolve_sender(
                message,
                hints.sender_id.as_deref(),
                message.is_sender,
                local,
                counterpart,
            )
        } else if message.is_sender {
            local.to_string()
        } else {
            counterpart.to_string()
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` in the host's local time zone.
pub fn format_timestamp(secs: i64) -> String {
    format_timestamp_with(secs, &Local)
}

/// Out-of-range timestamps fall back to the raw seconds.
pub fn format_timestamp_with<Tz>(secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_opt(secs, 0).earliest() {
        Some(time) => time.format(TIME_FORMAT).to_string(),
        None => secs.to_string(),
    }
}

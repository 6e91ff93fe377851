use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::CHATROOM_SUFFIX;

/// One stored chat event, as read from a message database row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub local_id: i64,
    /// Server-assigned id, decimal-formatted from the stored 64-bit integer.
    pub server_id: String,
    pub msg_type: i64,
    pub sub_type: i64,
    /// Authored by the local account.
    pub is_sender: bool,
    /// Creation time in epoch seconds.
    pub create_time: i64,
    /// Conversation the message belongs to.
    pub talker: String,
    pub content: String,
    /// Opaque extension blob; may be empty.
    #[serde(skip)]
    pub extra: Vec<u8>,
}

impl RawMessage {
    pub fn is_chatroom(&self) -> bool {
        self.talker.ends_with(CHATROOM_SUFFIX)
    }

    pub fn kind(&self) -> MessageType {
        MessageType::from_code(self.msg_type)
    }

    pub fn misc_kind(&self) -> MiscSubtype {
        MiscSubtype::from_code(self.sub_type)
    }
}

/// A conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactIdentity {
    pub account_id: String,
    pub nickname: String,
}

impl ContactIdentity {
    /// Nickname, or the account id when the nickname is blank.
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.account_id
        } else {
            &self.nickname
        }
    }
}

impl std::fmt::Display for ContactIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Injected capability resolving account ids to nicknames.
pub trait NicknameLookup {
    /// `None` when the account is unknown or the lookup failed.
    fn nickname(&self, account_id: &str) -> Option<String>;

    /// Nickname, or the account id itself when missing or blank.
    fn display_name(&self, account_id: &str) -> String {
        match self.nickname(account_id) {
            Some(name) if !name.is_empty() => name,
            _ => account_id.to_string(),
        }
    }
}

impl NicknameLookup for HashMap<String, String> {
    fn nickname(&self, account_id: &str) -> Option<String> {
        self.get(account_id).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Picture,
    Voice,
    VisitCard,
    Video,
    Emoji,
    Location,
    Misc,
    Voip,
    System,
    Unknown(i64),
}

impl MessageType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Text,
            3 => Self::Picture,
            34 => Self::Voice,
            42 => Self::VisitCard,
            43 => Self::Video,
            47 => Self::Emoji,
            48 => Self::Location,
            49 => Self::Misc,
            50 => Self::Voip,
            10000 => Self::System,
            other => Self::Unknown(other),
        }
    }

    /// Types whose extension hints point at image-like media.
    pub fn carries_media_hint(self) -> bool {
        matches!(self, Self::Picture | Self::Video | Self::Misc)
    }
}

/// Subtypes of [`MessageType::Misc`] (app messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiscSubtype {
    File,
    CustomEmoji,
    ShareEmoji,
    ForwardedMessage,
    Applet,
    Applet2,
    Channel,
    Refer,
    Live,
    Game,
    Notice,
    Live2,
    Listen,
    Transfer,
    RedPacket,
    Unknown(i64),
}

impl MiscSubtype {
    pub fn from_code(code: i64) -> Self {
        match code {
            6 => Self::File,
            8 => Self::CustomEmoji,
            15 => Self::ShareEmoji,
            19 => Self::ForwardedMessage,
            33 => Self::Applet,
            36 => Self::Applet2,
            51 => Self::Channel,
            57 => Self::Refer,
            63 => Self::Live,
            68 => Self::Game,
            87 => Self::Notice,
            88 => Self::Live2,
            92 => Self::Listen,
            2000 => Self::Transfer,
            2003 => Self::RedPacket,
            other => Self::Unknown(other),
        }
    }
}

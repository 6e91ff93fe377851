use serde::{Deserialize, Serialize};

use chatlog_shared::ContactIdentity;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A conversation with at least one stored message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationSummary {
    /// Account id of the counterpart, or the chatroom id.
    pub account_id: String,
    /// Empty when the talker has no contact row.
    pub nickname: String,
    /// Messages across every message database.
    pub message_count: u64,
}

impl ConversationSummary {
    pub fn identity(&self) -> ContactIdentity {
        ContactIdentity {
            account_id: self.account_id.clone(),
            nickname: self.nickname.clone(),
        }
    }
}

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};

use chatlog_shared::NicknameLookup;

use crate::database::ChatStore;
use crate::error::Result;
use crate::models::ConversationSummary;

impl ChatStore {
    /// `Contact.NickName` for `account_id`, `None` without a contact row.
    pub fn nickname(&self, account_id: &str) -> Result<Option<String>> {
        let nickname: Option<Option<String>> = self
            .contacts_conn()
            .query_row(
                "SELECT NickName FROM Contact WHERE UserName = ?1",
                params![account_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(nickname.flatten())
    }

    /// Conversations with at least one message, busiest first.
    ///
    /// Talkers without a contact row are listed with an empty nickname.
    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let nicknames = self.all_nicknames()?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for db in self.message_dbs() {
            let mut stmt = db
                .conn
                .prepare("SELECT StrTalker, COUNT(*) FROM MSG GROUP BY StrTalker")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (talker, count) = row?;
                if let Some(talker) = talker.filter(|t| !t.is_empty()) {
                    *counts.entry(talker).or_default() += u64::try_from(count).unwrap_or(0);
                }
            }
        }

        let mut conversations: Vec<ConversationSummary> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(account_id, message_count)| ConversationSummary {
                nickname: nicknames.get(&account_id).cloned().unwrap_or_default(),
                account_id,
                message_count,
            })
            .collect();

        conversations.sort_by(|a, b| {
            b.message_count
                .cmp(&a.message_count)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        Ok(conversations)
    }

    fn all_nicknames(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .contacts_conn()
            .prepare("SELECT UserName, NickName FROM Contact")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (user, nick) = row?;
            map.insert(user, nick);
        }
        Ok(map)
    }
}

impl NicknameLookup for ChatStore {
    fn nickname(&self, account_id: &str) -> Option<String> {
        match ChatStore::nickname(self, account_id) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "nickname lookup failed");
                None
            }
        }
    }
}

use std::path::Path;

use rusqlite::params;

use chatlog_shared::RawMessage;

use crate::database::{ChatStore, MessageDatabase};
use crate::error::{Result, StoreError};

impl ChatStore {
    /// Message databases holding at least one row for `talker`.
    pub fn message_databases_for(&self, talker: &str) -> Result<Vec<&Path>> {
        let paths: Vec<&Path> = self
            .shards_with(talker)?
            .into_iter()
            .map(|db| db.path.as_path())
            .collect();
        if paths.is_empty() {
            return Err(StoreError::NoMessages(talker.to_string()));
        }
        Ok(paths)
    }

    /// Every message for `talker`, ascending by creation time within each
    /// shard, shards concatenated in discovery order.
    ///
    /// Rows that fail to decode are logged and skipped.
    pub fn messages_for(&self, talker: &str) -> Result<Vec<RawMessage>> {
        let shards = self.shards_with(talker)?;
        if shards.is_empty() {
            return Err(StoreError::NoMessages(talker.to_string()));
        }

        let mut messages = Vec::new();
        for db in shards {
            let mut stmt = db.conn.prepare(
                "SELECT localId, MsgSvrID, Type, SubType, IsSender, CreateTime,
                        StrTalker, StrContent, BytesExtra
                 FROM MSG
                 WHERE StrTalker = ?1
                 ORDER BY CreateTime ASC",
            )?;
            let rows = stmt.query_map(params![talker], row_to_message)?;

            for row in rows {
                match row {
                    Ok(message) => messages.push(message),
                    Err(e) => tracing::warn!(
                        db = %db.path.display(),
                        talker,
                        error = %e,
                        "skipping unreadable message row"
                    ),
                }
            }
        }

        tracing::debug!(talker, count = messages.len(), "messages loaded");
        Ok(messages)
    }

    fn shards_with(&self, talker: &str) -> Result<Vec<&MessageDatabase>> {
        let mut found = Vec::new();
        for db in self.message_dbs() {
            let present: bool = db.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM MSG WHERE StrTalker = ?1)",
                params![talker],
                |row| row.get(0),
            )?;
            if present {
                found.push(db);
            }
        }
        Ok(found)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMessage> {
    let server_id: Option<i64> = row.get(1)?;
    let is_sender: Option<i64> = row.get(4)?;
    let content: Option<String> = row.get(7)?;
    let extra: Option<Vec<u8>> = row.get(8)?;

    Ok(RawMessage {
        local_id: row.get(0)?,
        server_id: server_id.unwrap_or_default().to_string(),
        msg_type: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        sub_type: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        is_sender: is_sender == Some(1),
        create_time: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
        talker: row.get(6)?,
        content: content.unwrap_or_default(),
        extra: extra.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::database::fixtures;

    fn store_with_two_shards(dir: &Path) -> ChatStore {
        fixtures::contact_db(dir, &[("wxid_peer", "Peer")]);
        fixtures::message_db(
            dir,
            "MSG0.db",
            &[
                (1, 1001, 1, 0, 200, "wxid_peer", "second"),
                (2, 1000, 1, 1, 100, "wxid_peer", "first"),
                (3, 1002, 1, 0, 150, "room@chatroom", "elsewhere"),
            ],
        );
        fixtures::message_db(dir, "MSG1.db", &[(1, 2000, 3, 0, 50, "wxid_peer", "<img/>")]);
        ChatStore::open(dir).unwrap()
    }

    #[test]
    fn messages_sorted_per_shard_and_concatenated() {
        let dir = tempdir().unwrap();
        let store = store_with_two_shards(dir.path());

        let messages = store.messages_for("wxid_peer").unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "<img/>"]);

        let first = &messages[0];
        assert_eq!(first.server_id, "1000");
        assert!(first.is_sender);
        assert!(first.extra.is_empty());
        assert!(!messages[1].is_sender);
        assert_eq!(messages[2].msg_type, 3);
    }

    #[test]
    fn shard_filter_by_talker() {
        let dir = tempdir().unwrap();
        let store = store_with_two_shards(dir.path());

        assert_eq!(store.message_databases_for("wxid_peer").unwrap().len(), 2);
        let room = store.message_databases_for("room@chatroom").unwrap();
        assert!(room[0].ends_with("MSG0.db"));
    }

    #[test]
    fn unknown_talker_has_no_messages() {
        let dir = tempdir().unwrap();
        let store = store_with_two_shards(dir.path());

        assert!(matches!(
            store.messages_for("wxid_ghost"),
            Err(StoreError::NoMessages(t)) if t == "wxid_ghost"
        ));
        assert!(matches!(
            store.message_databases_for("wxid_ghost"),
            Err(StoreError::NoMessages(_))
        ));
    }
}

//! Connection management.
//!
//! [`ChatStore`] owns one read-only connection to the contact database and
//! one per message database shard, discovered once at open time.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use chatlog_shared::constants::{CONTACT_DB_FILE, MSG_DIR, MULTI_DIR};

use crate::error::{Result, StoreError};

/// One `MSG*.db` shard.
pub(crate) struct MessageDatabase {
    pub(crate) path: PathBuf,
    pub(crate) conn: Connection,
}

pub struct ChatStore {
    root: PathBuf,
    contacts: Connection,
    message_dbs: Vec<MessageDatabase>,
}

impl ChatStore {
    /// Open the storage rooted at `root`.
    ///
    /// Fails with [`StoreError::NotFound`] when `Msg/MicroMsg.db` is
    /// missing. Missing message shards are not an error here.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let contact_path = root.join(MSG_DIR).join(CONTACT_DB_FILE);
        if !contact_path.is_file() {
            return Err(StoreError::NotFound(contact_path));
        }

        tracing::info!(path = %contact_path.display(), "opening contact database");
        let contacts = open_read_only(&contact_path)?;

        let message_dbs = discover_message_databases(&root.join(MSG_DIR).join(MULTI_DIR))
            .into_iter()
            .map(|path| {
                let conn = open_read_only(&path)?;
                Ok(MessageDatabase { path, conn })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(shards = message_dbs.len(), "message databases discovered");

        Ok(Self {
            root,
            contacts,
            message_dbs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of every discovered message database, in discovery order.
    pub fn message_database_paths(&self) -> Vec<&Path> {
        self.message_dbs.iter().map(|db| db.path.as_path()).collect()
    }

    pub(crate) fn contacts_conn(&self) -> &Connection {
        &self.contacts
    }

    pub(crate) fn message_dbs(&self) -> &[MessageDatabase] {
        &self.message_dbs
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// `MSG.db` (or `MSG0.db` when absent), then `MSG1.db`, `MSG2.db`, ... up to
/// the first missing index.
pub(crate) fn discover_message_databases(multi_dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    let plain = multi_dir.join("MSG.db");
    let zero = multi_dir.join("MSG0.db");
    if plain.is_file() {
        found.push(plain);
    } else if zero.is_file() {
        found.push(zero);
    }

    for index in 1.. {
        let shard = multi_dir.join(format!("MSG{index}.db"));
        if !shard.is_file() {
            break;
        }
        found.push(shard);
    }
    found
}

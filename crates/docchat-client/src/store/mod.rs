//! Local durable chat storage
//!
//! A [`ChatDatabase`] holds two logical tables inside one named database:
//! an auto-keyed append log of messages and a single-slot session cell.
//! Values live in a [`KeyValueBackend`] as JSON strings, so the same database
//! runs on files, in memory or on top of browser storage.

use std::cell::Cell;

use docchat_types::{HistoryRecord, Message, SessionId};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;

pub use memory::MemoryBackend;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

const SCHEMA_VERSION: u32 = 1;
const SCHEMA_TABLE: &str = "schema";
const HISTORY_TABLE: &str = "chat_history";
const SESSION_TABLE: &str = "session";

/// String key-value storage underneath a [`ChatDatabase`]
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryTable {
    next_id: u64,
    records: Vec<HistoryRecord>,
}

/// Message log plus session cell, created lazily on first access
pub struct ChatDatabase<B> {
    name: String,
    backend: B,
    initialized: Cell<bool>,
}

impl<B: KeyValueBackend> ChatDatabase<B> {
    /// Open a database by name; nothing is touched until the first operation
    pub fn open(name: impl Into<String>, backend: B) -> Self {
        Self {
            name: name.into(),
            backend,
            initialized: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn key(&self, table: &str) -> String {
        format!("{}.{}", self.name, table)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        if self.initialized.get() {
            return Ok(());
        }

        let schema_key = self.key(SCHEMA_TABLE);
        if self.backend.get(&schema_key)?.is_none() {
            log::info!("Creating chat database {}", self.name);
            if self.backend.get(&self.key(HISTORY_TABLE))?.is_none() {
                self.write_history(&HistoryTable {
                    next_id: 1,
                    records: Vec::new(),
                })?;
            }
            self.backend.set(&schema_key, &SCHEMA_VERSION.to_string())?;
        }

        self.initialized.set(true);
        Ok(())
    }

    fn read_history(&self) -> Result<HistoryTable, StoreError> {
        let key = self.key(HISTORY_TABLE);
        match self.backend.get(&key)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt { key, source }),
            None => Ok(HistoryTable {
                next_id: 1,
                records: Vec::new(),
            }),
        }
    }

    fn write_history(&self, table: &HistoryTable) -> Result<(), StoreError> {
        let key = self.key(HISTORY_TABLE);
        let json = serde_json::to_string(table).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })?;
        self.backend.set(&key, &json)
    }

    /// Append a message and return its id
    pub fn append_message(&self, message: &Message) -> Result<u64, StoreError> {
        self.ensure_schema()?;

        let mut table = self.read_history()?;
        let id = table.next_id.max(1);
        table.next_id = id + 1;
        table.records.push(HistoryRecord {
            id,
            message: message.clone(),
        });
        self.write_history(&table)?;

        log::debug!("Stored {} message #{} in {}", message.role, id, self.name);
        Ok(id)
    }

    /// All stored messages in insertion order
    pub fn messages(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        self.ensure_schema()?;
        Ok(self.read_history()?.records)
    }

    /// Drop every stored message; ids are not reused
    pub fn clear_messages(&self) -> Result<(), StoreError> {
        self.ensure_schema()?;

        let mut table = self.read_history()?;
        table.records.clear();
        self.write_history(&table)
    }

    pub fn session_id(&self) -> Result<Option<SessionId>, StoreError> {
        self.ensure_schema()?;
        Ok(self
            .backend
            .get(&self.key(SESSION_TABLE))?
            .filter(|id| !id.is_empty()))
    }

    pub fn set_session_id(&self, session_id: &str) -> Result<(), StoreError> {
        self.ensure_schema()?;
        self.backend.set(&self.key(SESSION_TABLE), session_id)
    }

    pub fn clear_session_id(&self) -> Result<(), StoreError> {
        self.ensure_schema()?;
        self.backend.remove(&self.key(SESSION_TABLE))
    }

    /// Clear the message log and the session cell together
    pub fn reset(&self) -> Result<(), StoreError> {
        self.clear_messages()?;
        self.clear_session_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn database() -> ChatDatabase<MemoryBackend> {
        ChatDatabase::open("TestDB", MemoryBackend::new())
    }

    #[test]
    fn test_schema_created_lazily() {
        let db = database();
        assert!(db.backend().is_empty());

        assert!(db.messages().unwrap().is_empty());
        assert_eq!(db.backend().get("TestDB.schema").unwrap().as_deref(), Some("1"));
        assert!(db.backend().get("TestDB.chat_history").unwrap().is_some());
    }

    #[test]
    fn test_schema_creation_is_idempotent() {
        let backend = MemoryBackend::new();
        let first = ChatDatabase::open("TestDB", backend.clone());
        first.append_message(&Message::outgoing("<p>hello</p>")).unwrap();

        // A second open must not wipe what the first one stored
        let second = ChatDatabase::open("TestDB", backend);
        assert_eq!(second.messages().unwrap().len(), 1);
    }

    #[test]
    fn test_messages_in_insertion_order() {
        let db = database();
        db.append_message(&Message::outgoing("<p>q</p>")).unwrap();
        db.append_message(&Message::incoming("<p>a</p>")).unwrap();

        let messages: Vec<Message> = db.messages().unwrap().into_iter().map(|r| r.message).collect();
        assert_eq!(
            messages,
            vec![Message::outgoing("<p>q</p>"), Message::incoming("<p>a</p>")]
        );
    }

    #[test]
    fn test_ids_keep_increasing_across_clears() {
        let db = database();
        assert_eq!(db.append_message(&Message::outgoing("a")).unwrap(), 1);
        assert_eq!(db.append_message(&Message::incoming("b")).unwrap(), 2);

        db.clear_messages().unwrap();
        assert!(db.messages().unwrap().is_empty());
        assert_eq!(db.append_message(&Message::outgoing("c")).unwrap(), 3);
    }

    #[test]
    fn test_session_cell() {
        let db = database();
        assert_eq!(db.session_id().unwrap(), None);

        db.set_session_id("abc").unwrap();
        assert_eq!(db.session_id().unwrap().as_deref(), Some("abc"));

        db.set_session_id("def").unwrap();
        assert_eq!(db.session_id().unwrap().as_deref(), Some("def"));

        db.clear_session_id().unwrap();
        assert_eq!(db.session_id().unwrap(), None);
    }

    #[test]
    fn test_reset_clears_both_tables() {
        let db = database();
        db.append_message(&Message::outgoing("a")).unwrap();
        db.set_session_id("abc").unwrap();

        db.reset().unwrap();
        assert!(db.messages().unwrap().is_empty());
        assert_eq!(db.session_id().unwrap(), None);
    }

    #[test]
    fn test_databases_are_isolated_by_name() {
        let backend = MemoryBackend::new();
        let a = ChatDatabase::open("A", backend.clone());
        let b = ChatDatabase::open("B", backend);

        a.append_message(&Message::outgoing("only in a")).unwrap();
        assert!(b.messages().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_is_reported() {
        let db = database();
        db.messages().unwrap();
        db.backend().set("TestDB.chat_history", "not json").unwrap();

        assert!(matches!(db.messages(), Err(StoreError::Corrupt { .. })));
    }
}

//! Test doubles shared by unit and integration tests.
//!
//! Everything here is deterministic and offline: a fixed settings fixture,
//! an in-memory object store, and a reply recorder implementing
//! [`ChatContext`]. Compiled into the library so integration tests under
//! `tests/` can use the same doubles as the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::context::{ChatContext, MessageCard};
use crate::locale::LocaleStore;
use crate::modules::janken::JankenLedger;
use crate::queue::MusicQueues;
use crate::search::MusicSearcher;
use crate::state::AppState;
use crate::storage::{ObjectCache, ObjectStore, StorageError};

/// Fixed offline settings.
#[must_use]
pub fn test_settings() -> Settings {
    Settings {
        token: "test-token".to_string(),
        command_prefix: "!".to_string(),
        aws_region: "test-region-1".to_string(),
        aws_bucket: "test-bucket".to_string(),
        aws_access_key: "test-access-key".to_string(),
        aws_secret_key: "test-secret-key".to_string(),
        base_path: ".".to_string(),
        cache_path: "caches".to_string(),
        locale_path: "locales".to_string(),
        server_conf_entry: "server-conf".to_string(),
        janken_data_entry: "janken-data".to_string(),
        janken_resource_entry: "janken-resource".to_string(),
        player_resource_entry: "player-resource".to_string(),
    }
}

/// Object store backed by a shared in-memory map. Clones share contents, so
/// a test can keep a handle for assertions after moving a clone into the
/// code under test.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().expect("store mutex poisoned")
    }

    /// Seed an object.
    pub fn insert(&self, key: impl Into<String>, data: Vec<u8>) {
        self.locked().insert(key.into(), data);
    }

    /// Current bytes of an object, if present.
    #[must_use]
    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.locked().get(key).cloned()
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.locked().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.bytes(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.insert(key, body);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.locked().contains_key(key))
    }

    fn url_for(&self, key: &str) -> String {
        format!("https://s3-test-region-1.amazonaws.com/test-bucket/{key}")
    }
}

/// One recorded outbound reply
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    /// Plain text
    Text(String),
    /// Rich card
    Card(MessageCard),
    /// File upload: local path and outgoing filename
    File(PathBuf, String),
}

/// [`ChatContext`] that records every reply instead of sending it
pub struct RecordingContext {
    guild: u64,
    author: u64,
    name: String,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingContext {
    /// Context for the given guild and author.
    #[must_use]
    pub fn new(guild: u64, author: u64, name: impl Into<String>) -> Self {
        Self {
            guild,
            author,
            name: name.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("reply mutex poisoned").clone()
    }

    /// Only the plain-text replies, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().expect("reply mutex poisoned").push(sent);
    }
}

#[async_trait]
impl ChatContext for RecordingContext {
    fn guild_id(&self) -> u64 {
        self.guild
    }

    fn author_id(&self) -> u64 {
        self.author
    }

    fn author_name(&self) -> String {
        self.name.clone()
    }

    async fn say(&self, text: &str) -> anyhow::Result<()> {
        self.push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_card(&self, card: MessageCard) -> anyhow::Result<()> {
        self.push(Sent::Card(card));
        Ok(())
    }

    async fn send_file(&self, path: &Path, filename: &str) -> anyhow::Result<()> {
        self.push(Sent::File(path.to_path_buf(), filename.to_string()));
        Ok(())
    }
}

/// [`AppState`] over the given store and cache root, with empty locale,
/// catalogue and ledger state. Tests that need real resources load them into
/// the returned state's fields.
#[must_use]
pub fn offline_state(store: Arc<dyn ObjectStore>, cache_root: &Path) -> AppState {
    let settings = test_settings();
    AppState {
        cache: ObjectCache::new(store, cache_root),
        locales: LocaleStore::empty(),
        searcher: MusicSearcher::empty(),
        queues: MusicQueues::new(),
        ledger: JankenLedger::empty(format!("{}/records.json", settings.janken_data_entry)),
        settings,
    }
}

//! Shared process state.
//!
//! Every expensive or stateful resource is constructed exactly once here, at
//! startup, and handed to handlers by `Arc`. Nothing initializes lazily on
//! first access.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::locale::LocaleStore;
use crate::modules::janken::JankenLedger;
use crate::queue::MusicQueues;
use crate::search::MusicSearcher;
use crate::storage::{ObjectCache, ObjectStore};

/// Features with shipped locale resources.
pub const FEATURES: [&str; 3] = ["bot", "janken", "player"];

/// Process-wide application state
pub struct AppState {
    /// Loaded settings
    pub settings: Settings,
    /// Remote store behind the local disk mirror
    pub cache: ObjectCache,
    /// Locale resources
    pub locales: LocaleStore,
    /// Media catalogue + search index
    pub searcher: MusicSearcher,
    /// Per-guild playback queues
    pub queues: MusicQueues,
    /// Janken game-history ledger
    pub ledger: JankenLedger,
}

impl AppState {
    /// Construct all shared resources. Failures here abort startup: a
    /// missing media catalogue or unreadable locale directory is a
    /// deployment defect, not a runtime condition.
    ///
    /// # Errors
    ///
    /// Propagates locale, catalogue and ledger loading failures.
    pub async fn init(settings: Settings, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let cache = ObjectCache::new(store, settings.cache_root());
        let locales = LocaleStore::load(&settings.locale_root(), &FEATURES)?;
        info!("locale resources loaded");
        let searcher = MusicSearcher::build(&cache, &settings).await?;
        let ledger = JankenLedger::load(&cache, &settings).await?;
        Ok(Self {
            settings,
            cache,
            locales,
            searcher,
            queues: MusicQueues::new(),
            ledger,
        })
    }
}

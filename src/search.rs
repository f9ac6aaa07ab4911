//! Media catalogue and search index.
//!
//! The catalogue is described by remote schema documents: `root.json` lists
//! author codes, and each author ships one `schema_<locale>.json` per
//! language mapping music codes to metadata. At startup every schema is
//! loaded once into an in-memory index per language. Ranking is a plain
//! token-overlap score with per-field boosts; relevance quality is not a
//! concern of this module's callers.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::locale::Locale;
use crate::storage::{ObjectCache, StorageError};

const BOOST_TITLE: f32 = 2.0;
const BOOST_AUTHORS: f32 = 1.5;
const BOOST_ALIAS: f32 = 1.2;
const BOOST_ID: f32 = 0.05;

/// One playable entry of the media library
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Music {
    /// Display title
    pub title: String,
    /// Performing authors, primary first
    pub authors: Vec<String>,
    /// Free-form searchable alias text
    pub alias: String,
    /// Four-character id: author code + music code
    pub id: String,
}

impl Music {
    /// Split an id into its author and music codes.
    #[must_use]
    pub fn split_id(id: &str) -> Option<(&str, &str)> {
        if id.len() < 4 || !id.is_char_boundary(2) || !id.is_char_boundary(4) {
            return None;
        }
        Some((&id[0..2], &id[2..4]))
    }

    /// Store key of the playable resource for an id.
    #[must_use]
    pub fn resource_key(settings: &Settings, id: &str) -> Option<String> {
        let (author, music) = Self::split_id(id)?;
        Some(format!(
            "{}/{author}/{music}/resource.webm",
            settings.player_resource_entry
        ))
    }

    /// Store key of the thumbnail image for an id.
    #[must_use]
    pub fn thumbnail_key(settings: &Settings, id: &str) -> Option<String> {
        let (author, music) = Self::split_id(id)?;
        Some(format!(
            "{}/{author}/{music}/thumbnail.webp",
            settings.player_resource_entry
        ))
    }
}

#[derive(Deserialize)]
struct RootSchema {
    authors: Vec<String>,
}

/// Errors building the search index
#[derive(Debug, Error)]
pub enum SearchError {
    /// Remote schema fetch failed. A missing `root.json` is a deployment
    /// defect, so NotFound is fatal here.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Malformed schema document
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

struct IndexEntry {
    music: Music,
    title_tokens: Vec<String>,
    author_tokens: Vec<String>,
    alias_tokens: Vec<String>,
    id_token: String,
}

impl IndexEntry {
    fn new(music: Music) -> Self {
        let title_tokens = tokenize(&music.title);
        let author_tokens = tokenize(&music.authors.join(" "));
        let alias_tokens = tokenize(&music.alias);
        let id_token = music.id.to_lowercase();
        Self {
            music,
            title_tokens,
            author_tokens,
            alias_tokens,
            id_token,
        }
    }

    fn score(&self, query_tokens: &[String]) -> f32 {
        let mut score = 0.0;
        for token in query_tokens {
            if self.title_tokens.contains(token) {
                score += BOOST_TITLE;
            }
            if self.author_tokens.contains(token) {
                score += BOOST_AUTHORS;
            }
            if self.alias_tokens.contains(token) {
                score += BOOST_ALIAS;
            }
            if self.id_token == *token {
                score += BOOST_ID;
            }
        }
        score
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Per-language catalogue + search index, built once at startup
pub struct MusicSearcher {
    indexes: HashMap<Locale, Vec<IndexEntry>>,
}

impl MusicSearcher {
    /// An empty searcher (tests and tooling).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            indexes: HashMap::new(),
        }
    }

    /// Build from an already-loaded catalogue.
    #[must_use]
    pub fn from_catalogue(catalogue: HashMap<Locale, Vec<Music>>) -> Self {
        let indexes = catalogue
            .into_iter()
            .map(|(locale, musics)| {
                (locale, musics.into_iter().map(IndexEntry::new).collect())
            })
            .collect();
        Self { indexes }
    }

    /// Load every schema document from the remote store and build one index
    /// per locale.
    ///
    /// # Errors
    ///
    /// Fails when `root.json` or any referenced schema is missing or
    /// malformed; the library is assumed to ship complete.
    pub async fn build(cache: &ObjectCache, settings: &Settings) -> Result<Self, SearchError> {
        let root_key = format!("{}/root.json", settings.player_resource_entry);
        let root: RootSchema = serde_json::from_slice(&cache.read(&root_key, false).await?)?;

        // Schemas ship per language; neutral-locale searches fall back to
        // the English index (see entries).
        let mut catalogue: HashMap<Locale, Vec<Music>> = HashMap::new();
        for locale in Locale::ALL.into_iter().filter(|l| *l != Locale::None) {
            let mut musics = Vec::new();
            for author in &root.authors {
                let key = format!(
                    "{}/{author}/schema_{}.json",
                    settings.player_resource_entry,
                    locale.code()
                );
                let schema: HashMap<String, Music> =
                    serde_json::from_slice(&cache.read(&key, false).await?)?;
                musics.extend(schema.into_values());
            }
            info!(locale = %locale, entries = musics.len(), "indexed media catalogue");
            catalogue.insert(locale, musics);
        }
        Ok(Self::from_catalogue(catalogue))
    }

    fn entries(&self, locale: Locale) -> &[IndexEntry] {
        // Searches in the neutral locale fall back to the English index.
        let effective = if locale == Locale::None && !self.indexes.contains_key(&locale) {
            Locale::English
        } else {
            locale
        };
        self.indexes.get(&effective).map_or(&[], Vec::as_slice)
    }

    /// Look a music up by id in a locale's catalogue.
    #[must_use]
    pub fn find(&self, locale: Locale, id: &str) -> Option<Music> {
        self.entries(locale)
            .iter()
            .find(|entry| entry.music.id == id)
            .map(|entry| entry.music.clone())
    }

    /// Rank the locale's catalogue against a free-text request, best first.
    #[must_use]
    pub fn search(&self, request: &str, locale: Locale) -> Vec<Music> {
        let query_tokens = tokenize(request);
        let mut hits: Vec<(f32, &Music)> = self
            .entries(locale)
            .iter()
            .filter_map(|entry| {
                let score = entry.score(&query_tokens);
                (score > 0.0).then_some((score, &entry.music))
            })
            .collect();
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        hits.into_iter().map(|(_, music)| music.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn music(id: &str, title: &str, author: &str, alias: &str) -> Music {
        Music {
            title: title.to_string(),
            authors: vec![author.to_string()],
            alias: alias.to_string(),
            id: id.to_string(),
        }
    }

    fn searcher() -> MusicSearcher {
        let mut catalogue = HashMap::new();
        catalogue.insert(
            Locale::English,
            vec![
                music("ab01", "Morning Bell", "Aria", "wake up song"),
                music("ab02", "Evening Bell", "Aria", "sleep song"),
                music("cd01", "Bell Tower", "Canon", "morning chime"),
            ],
        );
        MusicSearcher::from_catalogue(catalogue)
    }

    #[test]
    fn split_id_requires_four_chars() {
        assert_eq!(Music::split_id("ab01"), Some(("ab", "01")));
        assert_eq!(Music::split_id("ab0"), None);
        assert_eq!(Music::split_id(""), None);
    }

    #[test]
    fn find_matches_exact_id() {
        let s = searcher();
        assert_eq!(
            s.find(Locale::English, "ab02").map(|m| m.title),
            Some("Evening Bell".to_string())
        );
        assert_eq!(s.find(Locale::English, "zz99"), None);
    }

    #[test]
    fn title_matches_outrank_alias_matches() {
        let s = searcher();
        let hits = s.search("morning", Locale::English);
        assert_eq!(hits.len(), 2);
        // "Morning Bell" hits on title (2.0), "Bell Tower" only on alias (1.2)
        assert_eq!(hits[0].id, "ab01");
        assert_eq!(hits[1].id, "cd01");
    }

    #[test]
    fn unmatched_query_returns_nothing() {
        assert!(searcher().search("polka", Locale::English).is_empty());
    }

    #[test]
    fn neutral_locale_falls_back_to_english_index() {
        let s = searcher();
        assert!(!s.search("bell", Locale::None).is_empty());
    }
}

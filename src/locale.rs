//! Localized resource files.
//!
//! Each feature ships one JSON resource file per locale under the locale
//! directory: `<feature>.json` for the language-neutral default plus
//! `<feature>_<code>.json` per language. Values are either template strings
//! with positional `{}` placeholders, plain string lists (command synonyms
//! and aliases), or structured values such as help sections. Lists are data;
//! nothing in a resource file is ever evaluated.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Supported locales. `None` is the language-neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// Language-neutral default
    #[default]
    None,
    /// English
    English,
    /// Korean
    Korean,
}

impl Locale {
    /// Every locale, neutral first.
    pub const ALL: [Self; 3] = [Self::None, Self::English, Self::Korean];

    /// Stable locale code, as stored in guild configuration.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::English => "en",
            Self::Korean => "ko",
        }
    }

    /// Parse a locale code (already lowercased codes only).
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors loading the locale directory
#[derive(Debug, Error)]
pub enum LocaleError {
    /// A resource file did not contain a JSON object
    #[error("locale file {0} is not a JSON object")]
    NotAnObject(String),
    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

type Document = HashMap<String, Value>;

/// All locale resources, loaded once at startup
pub struct LocaleStore {
    documents: HashMap<(String, Locale), Document>,
}

impl LocaleStore {
    /// Load every feature's resource files from `dir`. A feature's neutral
    /// file must exist; per-language files are optional.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed resource files.
    pub fn load(dir: &Path, features: &[&str]) -> Result<Self, LocaleError> {
        let mut documents = HashMap::new();
        for feature in features {
            for locale in Locale::ALL {
                let filename = match locale {
                    Locale::None => format!("{feature}.json"),
                    _ => format!("{feature}_{}.json", locale.code()),
                };
                let path = dir.join(&filename);
                if locale != Locale::None && !path.exists() {
                    continue;
                }
                let raw = std::fs::read_to_string(&path)?;
                let value: Value = serde_json::from_str(&raw)?;
                let Value::Object(map) = value else {
                    return Err(LocaleError::NotAnObject(filename));
                };
                documents.insert(
                    ((*feature).to_string(), locale),
                    map.into_iter().collect(),
                );
            }
        }
        Ok(Self { documents })
    }

    /// An empty store (tests and tooling).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    /// View of one feature's resources in one locale, with fallback to the
    /// neutral file.
    #[must_use]
    pub fn properties<'a>(&'a self, feature: &str, locale: Locale) -> LocaleProperties<'a> {
        LocaleProperties {
            store: self,
            feature: feature.to_string(),
            locale,
        }
    }

    /// Primary command name and alias set of a feature: the name comes from
    /// the neutral file's `Command` key, aliases are the union of every
    /// locale's `Command_Alias` list.
    #[must_use]
    pub fn command_info(&self, feature: &str) -> (String, Vec<String>) {
        let name = self.properties(feature, Locale::None).text("Command");
        let mut aliases = Vec::new();
        for locale in Locale::ALL {
            for alias in self.properties(feature, locale).list("Command_Alias") {
                if alias != name && !aliases.contains(&alias) {
                    aliases.push(alias);
                }
            }
        }
        (name, aliases)
    }

    fn lookup(&self, feature: &str, locale: Locale, key: &str) -> Option<&Value> {
        self.documents
            .get(&(feature.to_string(), locale))
            .and_then(|doc| doc.get(key))
            .or_else(|| {
                self.documents
                    .get(&(feature.to_string(), Locale::None))
                    .and_then(|doc| doc.get(key))
            })
    }
}

/// One feature's resources resolved against one locale
pub struct LocaleProperties<'a> {
    store: &'a LocaleStore,
    feature: String,
    locale: Locale,
}

impl LocaleProperties<'_> {
    /// The locale this view resolves against.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Raw resource value, if present in this locale or the neutral file.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.store.lookup(&self.feature, self.locale, key)
    }

    /// Template or message string; missing keys resolve to the key itself.
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.value(key)
            .and_then(Value::as_str)
            .map_or_else(|| key.to_string(), ToString::to_string)
    }

    /// String-list resource (synonyms, aliases); missing keys are empty.
    #[must_use]
    pub fn list(&self, key: &str) -> Vec<String> {
        self.value(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fetch a template and fill its positional `{}` placeholders.
    #[must_use]
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        fill(&self.text(key), args)
    }
}

/// Replace successive `{}` placeholders with the given arguments. Surplus
/// placeholders render empty; surplus arguments are ignored.
#[must_use]
pub fn fill(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_replaces_placeholders_in_order() {
        assert_eq!(fill("{} beats {}", &["rock", "scissors"]), "rock beats scissors");
        assert_eq!(fill("no placeholders", &["x"]), "no placeholders");
        assert_eq!(fill("{} and {}", &["one"]), "one and ");
    }

    #[test]
    fn locale_codes_round_trip() {
        for locale in Locale::ALL {
            assert_eq!(Locale::parse(locale.code()), Some(locale));
        }
        assert_eq!(Locale::parse("jp"), None);
    }

    #[test]
    fn store_falls_back_to_neutral_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("demo.json"),
            r#"{"Greeting": "hello", "Only_Neutral": "base", "Words": ["a", "b"]}"#,
        )
        .expect("neutral file");
        std::fs::write(dir.path().join("demo_ko.json"), r#"{"Greeting": "안녕"}"#)
            .expect("korean file");

        let store = LocaleStore::load(dir.path(), &["demo"]).expect("load");
        let ko = store.properties("demo", Locale::Korean);
        assert_eq!(ko.text("Greeting"), "안녕");
        assert_eq!(ko.text("Only_Neutral"), "base");
        assert_eq!(ko.text("Missing_Key"), "Missing_Key");
        assert_eq!(ko.list("Words"), vec!["a", "b"]);
    }

    #[test]
    fn command_info_unions_aliases_across_locales() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("demo.json"),
            r#"{"Command": "demo", "Command_Alias": ["dm"]}"#,
        )
        .expect("neutral file");
        std::fs::write(
            dir.path().join("demo_en.json"),
            r#"{"Command_Alias": ["dm", "sample"]}"#,
        )
        .expect("english file");

        let store = LocaleStore::load(dir.path(), &["demo"]).expect("load");
        let (name, aliases) = store.command_info("demo");
        assert_eq!(name, "demo");
        assert_eq!(aliases, vec!["dm", "sample"]);
    }
}

//! Rock-paper-scissors with a persisted match ledger.
//!
//! The top-level command name and its aliases come from the feature's locale
//! files; the first argument is matched against locale synonym lists for the
//! actual move or subcommand. Match history lives as one JSON document in
//! the remote store, mirrored on disk and synced back after every game.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Settings;
use crate::context::{ChatContext, MessageCard};
use crate::dispatch::{handler, CommandGroup, LeafSpec};
use crate::guild::{self, GuildConfig};
use crate::locale::{LocaleProperties, LocaleStore};
use crate::state::AppState;
use crate::storage::ObjectCache;

/// A player's move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JankenChoice {
    /// Rock (0)
    Rock,
    /// Scissors (1)
    Scissors,
    /// Paper (2)
    Paper,
}

impl JankenChoice {
    /// Stable index used in resource keys.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Rock => 0,
            Self::Scissors => 1,
            Self::Paper => 2,
        }
    }

    /// Uniformly random move. Uuid v4 is the process's entropy source.
    #[must_use]
    pub fn random() -> Self {
        match Uuid::new_v4().as_u128() % 3 {
            0 => Self::Rock,
            1 => Self::Scissors,
            _ => Self::Paper,
        }
    }

    /// Result of playing `self` against `other`.
    #[must_use]
    pub const fn versus(self, other: Self) -> JankenResult {
        match (self, other) {
            (Self::Rock, Self::Rock)
            | (Self::Scissors, Self::Scissors)
            | (Self::Paper, Self::Paper) => JankenResult::Draw,
            (Self::Rock, Self::Scissors)
            | (Self::Scissors, Self::Paper)
            | (Self::Paper, Self::Rock) => JankenResult::Win,
            _ => JankenResult::Lose,
        }
    }
}

/// Outcome of one game, from the player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JankenResult {
    /// Player won
    Win,
    /// Player lost
    Lose,
    /// Draw
    Draw,
}

impl JankenResult {
    /// Resource-key suffix (`Record_Win` etc.).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "Win",
            Self::Lose => "Lose",
            Self::Draw => "Draw",
        }
    }
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Game outcome
    pub result: JankenResult,
    /// Day the game was played
    pub date: NaiveDate,
}

type Records = HashMap<String, Vec<RecordEntry>>;

/// Game-history ledger: user id → records, newest first. Persisted as one
/// JSON document in the remote store via the disk mirror.
pub struct JankenLedger {
    key: String,
    records: Mutex<Records>,
}

impl JankenLedger {
    fn ledger_key(settings: &Settings) -> String {
        format!("{}/records.json", settings.janken_data_entry)
    }

    /// Empty ledger bound to the given store key.
    #[must_use]
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Load the ledger document; an absent document is an empty ledger.
    ///
    /// # Errors
    ///
    /// Propagates transient store failures and malformed documents.
    pub async fn load(cache: &ObjectCache, settings: &Settings) -> Result<Self> {
        let key = Self::ledger_key(settings);
        let records = match cache.read(&key, true).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.is_not_found() => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            key,
            records: Mutex::new(records),
        })
    }

    /// Append a result for the user and sync the document: the mirror file
    /// is rewritten first, then pushed with `write_from_path`, keeping the
    /// mirror and the store in step for this one key.
    ///
    /// # Errors
    ///
    /// Propagates mirror-write and store failures.
    pub async fn record(
        &self,
        cache: &ObjectCache,
        user: &str,
        result: JankenResult,
        date: NaiveDate,
    ) -> Result<()> {
        let snapshot = {
            let mut records = self.records.lock().await;
            records
                .entry(user.to_string())
                .or_default()
                .insert(0, RecordEntry { result, date });
            serde_json::to_vec_pretty(&*records)?
        };
        let path = cache.local_path(&self.key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, snapshot).await?;
        cache.write_from_path(&self.key, &path).await?;
        Ok(())
    }

    /// All of a user's records, newest first.
    pub async fn all(&self, user: &str) -> Vec<RecordEntry> {
        self.records
            .lock()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    /// The user's most recent record.
    pub async fn last(&self, user: &str) -> Option<RecordEntry> {
        self.records
            .lock()
            .await
            .get(user)
            .and_then(|records| records.first().cloned())
    }
}

/// Invalid record-range argument
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// Not a `start:end` pair or bare index
    #[error("range query is not numeric")]
    Invalid,
    /// Indexes past the available records
    #[error("range is out of bounds")]
    OutOfRange,
}

/// Parse a `start:end` selection (or a bare index) against `len` items.
/// Empty bounds default to the full extent; an explicit `end` past the end
/// is clamped, a `start` past the end is rejected. Input is never evaluated,
/// only parsed.
///
/// # Errors
///
/// `Invalid` for non-numeric input, `OutOfRange` for impossible bounds.
pub fn parse_range(query: &str, len: usize) -> Result<Range<usize>, RangeError> {
    fn part(raw: &str, default: usize) -> Result<usize, RangeError> {
        if raw.is_empty() {
            Ok(default)
        } else {
            raw.parse().map_err(|_| RangeError::Invalid)
        }
    }

    match query.split_once(':') {
        Some((start_raw, end_raw)) => {
            let start = part(start_raw.trim(), 0)?;
            let end = part(end_raw.trim(), len)?.min(len);
            if start > end {
                return Err(RangeError::OutOfRange);
            }
            Ok(start..end)
        }
        None => {
            let index: usize = query.trim().parse().map_err(|_| RangeError::Invalid)?;
            if index >= len {
                return Err(RangeError::OutOfRange);
            }
            Ok(index..index + 1)
        }
    }
}

/// The janken command group; name and aliases come from the locale files.
#[must_use]
pub fn command_group(locales: &LocaleStore) -> CommandGroup {
    let (name, aliases) = locales.command_info("janken");
    CommandGroup {
        namespace: String::new(),
        qualify: false,
        commands: vec![LeafSpec {
            name,
            aliases,
            handler: handler(handle),
        }],
        children: vec![],
    }
}

async fn handle(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    args: Vec<String>,
) -> Result<()> {
    let Some(conf) = guild::load(&state, ctx.as_ref(), false).await? else {
        return Ok(());
    };
    let locale = state.locales.properties("janken", conf.locale());
    let sub = args.first().map(|s| s.to_lowercase()).unwrap_or_default();

    if locale.list("Command_Rock").contains(&sub) {
        game(&state, ctx.as_ref(), &conf, &locale, JankenChoice::Rock).await
    } else if locale.list("Command_Scissors").contains(&sub) {
        game(&state, ctx.as_ref(), &conf, &locale, JankenChoice::Scissors).await
    } else if locale.list("Command_Paper").contains(&sub) {
        game(&state, ctx.as_ref(), &conf, &locale, JankenChoice::Paper).await
    } else if locale.list("Command_Record").contains(&sub) {
        let query = args.get(1).map_or(":5", String::as_str);
        record_command(&state, ctx.as_ref(), &locale, query).await
    } else {
        crate::modules::send_help(ctx.as_ref(), &locale).await
    }
}

async fn game(
    state: &AppState,
    ctx: &dyn ChatContext,
    conf: &GuildConfig,
    locale: &LocaleProperties<'_>,
    choice: JankenChoice,
) -> Result<()> {
    let user_id = ctx.author_id().to_string();
    let today = Local::now().date_naive();

    if conf.janken.limit {
        if let Some(last) = state.ledger.last(&user_id).await {
            if last.date == today {
                return ctx.say(&locale.text("Janken_NextDay")).await;
            }
        }
    }

    let bot_choice = JankenChoice::random();
    let result = choice.versus(bot_choice);
    state
        .ledger
        .record(&state.cache, &user_id, result, today)
        .await?;

    let key = format!(
        "{}/{}/Default.mp4",
        state.settings.janken_resource_entry,
        bot_choice.index()
    );
    let path = state.cache.read_to_path(&key).await?;
    ctx.send_file(&path, &format!("{}.mp4", Uuid::new_v4())).await
}

async fn record_command(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
    query: &str,
) -> Result<()> {
    let user_id = ctx.author_id().to_string();
    let records = state.ledger.all(&user_id).await;

    let wins = records.iter().filter(|r| r.result == JankenResult::Win).count();
    let losses = records.iter().filter(|r| r.result == JankenResult::Lose).count();
    let draws = records.iter().filter(|r| r.result == JankenResult::Draw).count();
    let win_rate = if records.is_empty() {
        0.0
    } else {
        wins as f32 / records.len() as f32 * 100.0
    };

    let title = locale.format("Record_Title", &[&ctx.author_name()]);
    let subtitle = locale.format(
        "Record_Subtitle",
        &[
            &wins.to_string(),
            &losses.to_string(),
            &draws.to_string(),
            &format!("{win_rate:.1}"),
        ],
    );

    let lines = match parse_range(query, records.len()) {
        Ok(range) => records
            .get(range)
            .unwrap_or(&[])
            .iter()
            .map(|record| {
                let result = locale.text(&format!("Record_{}", record.result.as_str()));
                locale.format(
                    "Record_Field",
                    &[
                        &record.date.format("%Y").to_string(),
                        &record.date.format("%m").to_string(),
                        &record.date.format("%d").to_string(),
                        &result,
                    ],
                )
            })
            .collect(),
        Err(RangeError::Invalid) => vec![locale.format("Record_InvalidIndexer", &[query])],
        Err(RangeError::OutOfRange) => vec![locale.text("Record_OutOfRange")],
    };

    let mut card = MessageCard::new(title).description(subtitle);
    for line in lines {
        card = card.field(line, "");
    }
    ctx.send_card(card).await
}

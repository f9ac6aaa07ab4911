//! Per-guild playback queues.
//!
//! One shared table for the whole process, keyed by guild id. Entries are
//! guarded per key (dashmap shards + per-entry exclusive references), so two
//! commands racing on the same guild serialize while different guilds never
//! contend.

use dashmap::DashMap;
use std::collections::VecDeque;
use thiserror::Error;

use crate::search::Music;

/// Operation on a guild that has no queue entry
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no queue for guild {0}")]
pub struct QueueMissing(pub u64);

#[derive(Default)]
struct GuildQueue {
    items: VecDeque<Music>,
    latest: Option<Music>,
    looping: bool,
}

/// Shared guild-id → queue table
#[derive(Default)]
pub struct MusicQueues {
    queues: DashMap<u64, GuildQueue>,
}

impl MusicQueues {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the guild's queue, creating the entry on first use.
    pub fn add(&self, guild: u64, music: Music) {
        self.queues.entry(guild).or_default().items.push_back(music);
    }

    /// Front of the queue without removing it.
    ///
    /// # Errors
    ///
    /// Fails when the guild has no queue entry.
    pub fn peek(&self, guild: u64) -> Result<Option<Music>, QueueMissing> {
        let queue = self.queues.get(&guild).ok_or(QueueMissing(guild))?;
        Ok(queue.items.front().cloned())
    }

    /// Remove and return the front item, recording it as latest. With the
    /// loop flag set, the popped item is re-appended to the back.
    ///
    /// # Errors
    ///
    /// Fails when the guild has no queue entry.
    pub fn pop(&self, guild: u64) -> Result<Option<Music>, QueueMissing> {
        let mut queue = self.queues.get_mut(&guild).ok_or(QueueMissing(guild))?;
        let Some(music) = queue.items.pop_front() else {
            return Ok(None);
        };
        queue.latest = Some(music.clone());
        if queue.looping {
            queue.items.push_back(music.clone());
        }
        Ok(Some(music))
    }

    /// Snapshot of the guild's queued items, front first.
    ///
    /// # Errors
    ///
    /// Fails when the guild has no queue entry.
    pub fn all(&self, guild: u64) -> Result<Vec<Music>, QueueMissing> {
        let queue = self.queues.get(&guild).ok_or(QueueMissing(guild))?;
        Ok(queue.items.iter().cloned().collect())
    }

    /// Most recently popped item.
    ///
    /// # Errors
    ///
    /// Fails when the guild has no queue entry.
    pub fn latest(&self, guild: u64) -> Result<Option<Music>, QueueMissing> {
        let queue = self.queues.get(&guild).ok_or(QueueMissing(guild))?;
        Ok(queue.latest.clone())
    }

    /// Whether the guild has a queue entry at all.
    #[must_use]
    pub fn is_exist(&self, guild: u64) -> bool {
        self.queues.contains_key(&guild)
    }

    /// True when the guild has no entry or an empty queue.
    #[must_use]
    pub fn is_empty(&self, guild: u64) -> bool {
        self.queues.get(&guild).map_or(true, |q| q.items.is_empty())
    }

    /// Set the loop flag. No-op for guilds without an entry.
    pub fn set_loop(&self, guild: u64, looping: bool) {
        if let Some(mut queue) = self.queues.get_mut(&guild) {
            queue.looping = looping;
        }
    }

    /// Loop flag; `false` for guilds without an entry.
    #[must_use]
    pub fn is_loop(&self, guild: u64) -> bool {
        self.queues.get(&guild).is_some_and(|q| q.looping)
    }

    /// Drop the guild's whole entry (queue, latest slot, loop flag).
    pub fn free(&self, guild: u64) {
        self.queues.remove(&guild);
    }
}

//! Reply surface handed to command handlers.
//!
//! Handlers never touch the chat platform API; they describe replies through
//! this trait and the transport renders them (cards become HTML messages on
//! Telegram).

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// One field of a [`MessageCard`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    /// Field heading
    pub name: String,
    /// Field body, may be empty
    pub value: String,
}

/// A rich reply: title, optional description, fields, optional thumbnail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageCard {
    /// Card title
    pub title: String,
    /// Optional body text under the title
    pub description: Option<String>,
    /// Ordered fields
    pub fields: Vec<CardField>,
    /// Public URL of a thumbnail image
    pub thumbnail_url: Option<String>,
}

impl MessageCard {
    /// Start a card with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Set the thumbnail URL.
    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// Inbound-command context: who asked, where, and how to reply.
#[async_trait]
pub trait ChatContext: Send + Sync {
    /// Guild (chat) the command arrived from.
    fn guild_id(&self) -> u64;

    /// Author of the command.
    fn author_id(&self) -> u64;

    /// Display name of the author.
    fn author_name(&self) -> String;

    /// Send a plain text reply.
    async fn say(&self, text: &str) -> Result<()>;

    /// Send one card.
    async fn send_card(&self, card: MessageCard) -> Result<()>;

    /// Send several cards in order.
    async fn send_cards(&self, cards: Vec<MessageCard>) -> Result<()> {
        for card in cards {
            self.send_card(card).await?;
        }
        Ok(())
    }

    /// Send a local file under the given outgoing filename.
    async fn send_file(&self, path: &Path, filename: &str) -> Result<()>;
}

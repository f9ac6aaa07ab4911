//! Telegram message handling.
//!
//! The dispatcher routes every text message here; messages carrying the
//! configured command prefix are stripped and handed to the command
//! registry. Handler failures are logged and answered with a generic
//! message, never surfaced raw to the chat.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::error;

use crate::context::{ChatContext, MessageCard};
use crate::dispatch::CommandRegistry;
use crate::state::AppState;

/// Display name of a message's author, `"Unknown"` when absent.
#[must_use]
pub fn get_user_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map_or_else(|| "Unknown".to_string(), |u| u.first_name.clone())
}

fn get_user_id(msg: &Message) -> u64 {
    msg.from.as_ref().map_or(0, |u| u.id.0)
}

/// [`ChatContext`] bound to one Telegram chat and author
pub struct TelegramContext {
    bot: Bot,
    chat_id: ChatId,
    author_id: u64,
    author_name: String,
}

impl TelegramContext {
    /// Context for the chat and author of `msg`.
    #[must_use]
    pub fn new(bot: Bot, msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            author_id: get_user_id(msg),
            author_name: get_user_name(msg),
            bot,
        }
    }
}

/// Render a card as a Telegram HTML message. A thumbnail becomes a
/// zero-width link so Telegram attaches its preview without visible text.
#[must_use]
pub fn render_card(card: &MessageCard) -> String {
    let mut out = String::new();
    if let Some(url) = &card.thumbnail_url {
        out.push_str(&format!("<a href=\"{url}\">&#8288;</a>"));
    }
    out.push_str(&format!("<b>{}</b>", html_escape::encode_text(&card.title)));
    if let Some(description) = &card.description {
        out.push('\n');
        out.push_str(&html_escape::encode_text(description));
    }
    for field in &card.fields {
        out.push_str("\n\n");
        out.push_str(&format!("<b>{}</b>", html_escape::encode_text(&field.name)));
        if !field.value.is_empty() {
            out.push('\n');
            out.push_str(&html_escape::encode_text(&field.value));
        }
    }
    out
}

#[async_trait]
impl ChatContext for TelegramContext {
    fn guild_id(&self) -> u64 {
        self.chat_id.0.unsigned_abs()
    }

    fn author_id(&self) -> u64 {
        self.author_id
    }

    fn author_name(&self) -> String {
        self.author_name.clone()
    }

    async fn say(&self, text: &str) -> Result<()> {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn send_card(&self, card: MessageCard) -> Result<()> {
        self.bot
            .send_message(self.chat_id, render_card(&card))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_file(&self, path: &Path, filename: &str) -> Result<()> {
        let file = InputFile::file(path).file_name(filename.to_string());
        self.bot.send_document(self.chat_id, file).await?;
        Ok(())
    }
}

/// Dispatcher endpoint for text messages. Non-command text is ignored;
/// command failures are logged and answered generically.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    registry: Arc<CommandRegistry>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };
    let Some(command) = text.strip_prefix(&state.settings.command_prefix) else {
        return respond(());
    };

    let ctx: Arc<dyn ChatContext> = Arc::new(TelegramContext::new(bot, &msg));
    if let Err(e) = registry.dispatch(state, ctx.clone(), command).await {
        error!("Command handler error: {e:#}");
        if let Err(e) = ctx
            .say("Something went wrong. Please try again later.")
            .await
        {
            error!("Failed to send error notice: {e:#}");
        }
    }
    respond(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_card_escapes_html() {
        let card = MessageCard::new("<title>")
            .description("a & b")
            .field("Name", "<x>");
        let html = render_card(&card);
        assert!(html.starts_with("<b>&lt;title&gt;</b>"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("<b>Name</b>\n&lt;x&gt;"));
    }

    #[test]
    fn render_card_places_thumbnail_link_first() {
        let card = MessageCard::new("t").thumbnail("https://example.test/p.webp");
        let html = render_card(&card);
        assert!(html.starts_with("<a href=\"https://example.test/p.webp\">"));
    }

    #[test]
    fn empty_field_values_render_heading_only() {
        let card = MessageCard::new("t").field("Only heading", "");
        assert!(render_card(&card).ends_with("<b>Only heading</b>"));
    }
}

//! Feature command groups.
//!
//! Each feature declares its commands as a [`CommandGroup`]; the binary
//! flattens them into the dispatch table at startup. The shared help
//! renderer and the unknown-command fallback also live here.

/// `dev.*` administration commands
pub mod dev;
/// Rock-paper-scissors game
pub mod janken;
/// Media playback and lookup
pub mod player;

use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

use crate::context::{ChatContext, MessageCard};
use crate::dispatch::{handler, CommandGroup, Handler};
use crate::guild::{self, GuildConfig};
use crate::locale::{Locale, LocaleProperties, LocaleStore};
use crate::state::AppState;

/// All command groups, in registration order.
#[must_use]
pub fn command_groups(locales: &LocaleStore) -> Vec<CommandGroup> {
    vec![
        dev::command_group(),
        janken::command_group(locales),
        player::command_group(locales),
    ]
}

/// Handler invoked for unknown command tokens.
#[must_use]
pub fn fallback_handler() -> Handler {
    handler(fallback)
}

async fn fallback(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    _args: Vec<String>,
) -> Result<()> {
    // Unregistered guilds still get help, in the neutral locale. The config
    // read is silent here; registration hints belong to the real commands.
    let key = guild::config_key(&state, ctx.guild_id());
    let locale = match state.cache.read(&key, false).await {
        Ok(data) => serde_json::from_slice::<GuildConfig>(&data)
            .map(|conf| conf.locale())
            .unwrap_or_default(),
        Err(_) => Locale::None,
    };
    let props = state.locales.properties("bot", locale);
    send_help(ctx.as_ref(), &props).await
}

#[derive(Deserialize)]
struct HelpSection {
    name: String,
    value: Vec<String>,
}

/// Render a feature's `Help_Title`/`Help_Field` resources as one card.
pub(crate) async fn send_help(
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
) -> Result<()> {
    let mut card = MessageCard::new(locale.text("Help_Title"));
    if let Some(value) = locale.value("Help_Field") {
        let sections: Vec<HelpSection> =
            serde_json::from_value(value.clone()).unwrap_or_default();
        for section in sections {
            card = card.field(section.name, section.value.join("\n"));
        }
    }
    ctx.send_card(card).await
}

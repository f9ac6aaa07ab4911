//! Administration commands under the `dev` namespace.
//!
//! `dev.register` creates the guild's configuration document; everything
//! else reads or mutates it, admin-gated. The nested `janken` child group
//! exists so game settings live under `dev.janken.*`.

use anyhow::Result;
use std::sync::Arc;

use crate::context::ChatContext;
use crate::dispatch::{handler, CommandGroup, LeafSpec};
use crate::guild::{self, GuildConfig};
use crate::locale::Locale;
use crate::state::AppState;

/// The `dev` command group: ping, register, locale, get_all_locales and the
/// nested `dev.janken.limit`.
#[must_use]
pub fn command_group() -> CommandGroup {
    CommandGroup {
        namespace: "dev".to_string(),
        qualify: true,
        commands: vec![
            LeafSpec {
                name: "ping".to_string(),
                aliases: vec![],
                handler: handler(ping),
            },
            LeafSpec {
                name: "register".to_string(),
                aliases: vec![],
                handler: handler(register),
            },
            LeafSpec {
                name: "locale".to_string(),
                aliases: vec![],
                handler: handler(locale),
            },
            LeafSpec {
                name: "get_all_locales".to_string(),
                aliases: vec![],
                handler: handler(get_all_locales),
            },
        ],
        children: vec![CommandGroup {
            namespace: "janken".to_string(),
            qualify: true,
            commands: vec![LeafSpec {
                name: "limit".to_string(),
                aliases: vec![],
                handler: handler(limit),
            }],
            children: vec![],
        }],
    }
}

async fn ping(_state: Arc<AppState>, ctx: Arc<dyn ChatContext>, _args: Vec<String>) -> Result<()> {
    ctx.say("pong").await
}

async fn register(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    _args: Vec<String>,
) -> Result<()> {
    let key = guild::config_key(&state, ctx.guild_id());
    if state.cache.exists(&key).await? {
        return ctx.say("Registration has already been completed.").await;
    }
    let conf = GuildConfig::new(ctx.author_id().to_string());
    state.cache.write(&key, serde_json::to_vec(&conf)?).await?;
    ctx.say("Registration Complete.").await?;
    ctx.say(&format!("User {} is now administrator.", ctx.author_id()))
        .await
}

async fn locale(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    args: Vec<String>,
) -> Result<()> {
    let Some(mut conf) = guild::load(&state, ctx.as_ref(), true).await? else {
        return Ok(());
    };
    if let Some(arg) = args.first() {
        let code = arg.to_lowercase();
        let Some(locale) = Locale::parse(&code) else {
            return ctx.say(&format!("'{code}' is not a valid locale")).await;
        };
        conf.locale = locale.code().to_string();
        if !guild::save(&state, ctx.as_ref(), &conf).await? {
            return Ok(());
        }
    }
    ctx.say(&format!("Locale is set to: {}", conf.locale)).await
}

async fn get_all_locales(
    _state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    _args: Vec<String>,
) -> Result<()> {
    let codes: Vec<&str> = Locale::ALL.iter().map(|l| l.code()).collect();
    ctx.say(&codes.join(", ")).await
}

async fn limit(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    args: Vec<String>,
) -> Result<()> {
    let Some(mut conf) = guild::load(&state, ctx.as_ref(), true).await? else {
        return Ok(());
    };
    let Some(operation) = args.first().map(String::as_str) else {
        return ctx
            .say(&format!("Limit is set to: {}", conf.janken.limit))
            .await;
    };
    match operation {
        "enable" => conf.janken.limit = true,
        "disable" => conf.janken.limit = false,
        _ => return ctx.say("Operation must be 'enable' or 'disable'.").await,
    }
    if !guild::save(&state, ctx.as_ref(), &conf).await? {
        return Ok(());
    }
    ctx.say(&format!("Janken: day limit {operation}d.")).await
}

//! Per-guild configuration documents.
//!
//! One JSON object per guild at `<server-conf-entry>/<guild-id>.json`,
//! created by `dev.register` and mutated only by the recorded administrator.
//! The wire format (field names and order) is fixed.

use serde::{Deserialize, Serialize};

use crate::context::ChatContext;
use crate::locale::Locale;
use crate::state::AppState;
use crate::storage::StorageError;

/// Message shown when a guild has no configuration document yet.
pub const MSG_NOT_REGISTERED: &str = "You have not yet registered your server.";
/// Message shown when a non-administrator attempts an admin operation.
pub const MSG_NOT_PERMITTED: &str = "Operation not permitted.";

/// Janken feature settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JankenConfig {
    /// Restrict each user to one game per day
    #[serde(rename = "Limit")]
    pub limit: bool,
}

/// Stored guild configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildConfig {
    /// User id of the recorded administrator
    #[serde(rename = "AdminID")]
    pub admin_id: String,
    /// Locale code (`none`, `en`, `ko`)
    #[serde(rename = "Locale")]
    pub locale: String,
    /// Janken settings
    #[serde(rename = "Janken")]
    pub janken: JankenConfig,
}

impl GuildConfig {
    /// Fresh configuration with the given administrator and defaults.
    #[must_use]
    pub fn new(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: admin_id.into(),
            locale: Locale::None.code().to_string(),
            janken: JankenConfig { limit: true },
        }
    }

    /// Parsed locale; unknown codes fall back to neutral.
    #[must_use]
    pub fn locale(&self) -> Locale {
        Locale::parse(&self.locale).unwrap_or(Locale::None)
    }
}

/// Store key of a guild's configuration document.
#[must_use]
pub fn config_key(state: &AppState, guild: u64) -> String {
    format!("{}/{guild}.json", state.settings.server_conf_entry)
}

/// Load the calling guild's configuration. Messages the user and returns
/// `None` when the guild is unregistered, or when `only_admin` is set and the
/// caller is not the recorded administrator.
///
/// # Errors
///
/// Propagates transient store failures and reply failures.
pub async fn load(
    state: &AppState,
    ctx: &dyn ChatContext,
    only_admin: bool,
) -> anyhow::Result<Option<GuildConfig>> {
    let key = config_key(state, ctx.guild_id());
    let data = match state.cache.read(&key, false).await {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) => {
            ctx.say(MSG_NOT_REGISTERED).await?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let conf: GuildConfig = serde_json::from_slice(&data)?;
    if only_admin && ctx.author_id().to_string() != conf.admin_id {
        ctx.say(MSG_NOT_PERMITTED).await?;
        return Ok(None);
    }
    Ok(Some(conf))
}

/// Persist a mutated configuration. Re-checks the administrator and the
/// document's existence; messages the user and returns `false` when either
/// check fails.
///
/// # Errors
///
/// Propagates transient store failures and reply failures.
pub async fn save(
    state: &AppState,
    ctx: &dyn ChatContext,
    conf: &GuildConfig,
) -> anyhow::Result<bool> {
    if ctx.author_id().to_string() != conf.admin_id {
        ctx.say(MSG_NOT_PERMITTED).await?;
        return Ok(false);
    }
    let key = config_key(state, ctx.guild_id());
    if !state.cache.exists(&key).await? {
        ctx.say(MSG_NOT_REGISTERED).await?;
        return Ok(false);
    }
    state.cache.write(&key, serde_json::to_vec(conf)?).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_stable() {
        let conf = GuildConfig::new("7");
        let json = serde_json::to_string(&conf).expect("serialize");
        assert_eq!(json, r#"{"AdminID":"7","Locale":"none","Janken":{"Limit":true}}"#);
    }

    #[test]
    fn unknown_locale_codes_fall_back_to_neutral() {
        let mut conf = GuildConfig::new("7");
        conf.locale = "xx".to_string();
        assert_eq!(conf.locale(), Locale::None);
        conf.locale = "ko".to_string();
        assert_eq!(conf.locale(), Locale::Korean);
    }
}

//! Configuration and settings management
//!
//! Settings live in a flat properties file (`global-configure.conf` by
//! default, relocatable via `BOT_CONFIG_PATH`) with environment variables
//! layered on top. On first run the shipped template is materialized and the
//! required secrets are prompted for on stdin.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Default location of the properties file.
pub const DEFAULT_CONFIG_PATH: &str = "global-configure.conf";

/// Environment variable overriding the properties-file location.
pub const CONFIG_PATH_VAR: &str = "BOT_CONFIG_PATH";

const EXAMPLE_TEMPLATE: &str = include_str!("../global-configure.conf.example");

/// Keys prompted for interactively on first run.
const REQUIRED_KEYS: [&str; 5] = [
    "token",
    "aws_region",
    "aws_bucket",
    "aws_access_key",
    "aws_secret_key",
];

/// Application settings loaded from the properties file and environment
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub token: String,

    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// S3 region
    pub aws_region: String,
    /// S3 bucket holding all bot objects
    pub aws_bucket: String,
    /// S3 access key id
    pub aws_access_key: String,
    /// S3 secret access key
    pub aws_secret_key: String,

    /// Root under which local paths are resolved
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Disk-mirror directory, relative to `base_path`
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// Locale-resource directory, relative to `base_path`
    #[serde(default = "default_locale_path")]
    pub locale_path: String,

    /// Store prefix for per-guild configuration documents
    #[serde(default = "default_server_conf_entry")]
    pub server_conf_entry: String,
    /// Store prefix for the janken ledger
    #[serde(default = "default_janken_data_entry")]
    pub janken_data_entry: String,
    /// Store prefix for janken result media
    #[serde(default = "default_janken_resource_entry")]
    pub janken_resource_entry: String,
    /// Store prefix for the media library (schemas, resources, thumbnails)
    #[serde(default = "default_player_resource_entry")]
    pub player_resource_entry: String,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_base_path() -> String {
    ".".to_string()
}

fn default_cache_path() -> String {
    "caches".to_string()
}

fn default_locale_path() -> String {
    "locales".to_string()
}

fn default_server_conf_entry() -> String {
    "server-conf".to_string()
}

fn default_janken_data_entry() -> String {
    "janken-data".to_string()
}

fn default_janken_resource_entry() -> String {
    "janken-resource".to_string()
}

fn default_player_resource_entry() -> String {
    "player-resource".to_string()
}

/// Resolve the properties-file location, honoring [`CONFIG_PATH_VAR`].
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_VAR)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

impl Settings {
    /// Load settings from the properties file with environment overrides
    /// (`BOT_` prefix).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing or a required key
    /// cannot be deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        let path = config_path();
        let s = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini).required(true))
            .add_source(Environment::with_prefix("BOT"))
            .build()?;
        s.try_deserialize()
    }

    /// Directory holding the local disk mirror of remote objects.
    #[must_use]
    pub fn cache_root(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.cache_path)
    }

    /// Directory holding the localized resource files.
    #[must_use]
    pub fn locale_root(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.locale_path)
    }
}

/// Make sure the properties file exists, materializing it from the shipped
/// template and prompting for the required secrets on first run.
///
/// # Errors
///
/// Returns an error if the file cannot be written or stdin is closed.
pub fn ensure_config_file() -> io::Result<PathBuf> {
    let path = config_path();
    if path.exists() {
        return Ok(path);
    }

    println!("No configuration found at {}.", path.display());
    println!("Creating one from the template; please fill in the values.");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut rendered = String::new();
    for line in EXAMPLE_TEMPLATE.lines() {
        let key = line.split('=').next().unwrap_or_default().trim();
        if REQUIRED_KEYS.contains(&key) {
            print!("{key}: ");
            io::stdout().flush()?;
            let mut value = String::new();
            input.read_line(&mut value)?;
            rendered.push_str(&format!("{key}={}\n", value.trim()));
        } else {
            rendered.push_str(line);
            rendered.push('\n');
        }
    }
    std::fs::write(&path, rendered)?;
    println!("Wrote {}.", path.display());
    Ok(path)
}

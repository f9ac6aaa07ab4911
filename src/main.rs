use dotenvy::dotenv;
use hibiki_bot::bot::handlers::handle_message;
use hibiki_bot::config::{ensure_config_file, Settings};
use hibiki_bot::dispatch::CommandRegistry;
use hibiki_bot::modules;
use hibiki_bot::state::AppState;
use hibiki_bot::storage::{ObjectStore, RemoteStore};
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    aws_key: Regex,
    aws_secret: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            aws_key: Regex::new(r"aws_access_key=[^\s&]+")?,
            aws_secret: Regex::new(r"aws_secret_key=[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .aws_key
            .replace_all(&output, "aws_access_key=[MASKED]")
            .to_string();
        output = self
            .aws_secret
            .replace_all(&output, "aws_secret_key=[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with redaction
    init_logging(patterns);

    info!("Starting hibiki bot...");

    // Materialize the properties file on first run, then load settings
    ensure_config_file()?;
    let settings = init_settings();

    // Initialize remote storage and all shared state
    let store: Arc<dyn ObjectStore> = Arc::new(init_store(&settings).await);
    let state = init_state(settings.clone(), store).await;

    // Build the dispatch table; a command-name collision aborts startup
    let registry = match CommandRegistry::build(
        modules::command_groups(&state.locales),
        modules::fallback_handler(),
    ) {
        Ok(registry) => {
            info!("Command registry built: {} entries.", registry.len());
            Arc::new(registry)
        }
        Err(e) => {
            error!("Failed to build command registry: {}", e);
            std::process::exit(1);
        }
    };

    let bot = Bot::new(settings.token.clone());

    info!("Bot is running...");

    let handler = Update::filter_message().endpoint(handle_message);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, registry])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_store(settings: &Settings) -> RemoteStore {
    let store = RemoteStore::new(settings).await;
    info!("Remote storage initialized.");
    store
}

async fn init_state(settings: Settings, store: Arc<dyn ObjectStore>) -> Arc<AppState> {
    match AppState::init(settings, store).await {
        Ok(state) => {
            info!("Application state initialized.");
            Arc::new(state)
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    }
}

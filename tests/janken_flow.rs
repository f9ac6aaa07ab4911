//! Janken games and record queries through the dispatcher.

use std::path::Path;
use std::sync::Arc;

use hibiki_bot::dispatch::CommandRegistry;
use hibiki_bot::locale::LocaleStore;
use hibiki_bot::modules;
use hibiki_bot::state::{AppState, FEATURES};
use hibiki_bot::testing::{offline_state, InMemoryStore, RecordingContext, Sent};

const GUILD: u64 = 42;
const PLAYER: u64 = 7;

struct Fixture {
    store: InMemoryStore,
    state: Arc<AppState>,
    registry: CommandRegistry,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = InMemoryStore::default();
    // Registered guild and the three result clips.
    store.insert(
        "server-conf/42.json",
        br#"{"AdminID":"7","Locale":"none","Janken":{"Limit":true}}"#.to_vec(),
    );
    for index in 0..3 {
        store.insert(format!("janken-resource/{index}/Default.mp4"), b"clip".to_vec());
    }

    let mut state = offline_state(Arc::new(store.clone()), dir.path());
    state.locales =
        LocaleStore::load(Path::new("locales"), &FEATURES).expect("shipped locale files load");
    let registry =
        CommandRegistry::build(modules::command_groups(&state.locales), modules::fallback_handler())
            .expect("registry");
    Fixture {
        store,
        state: Arc::new(state),
        registry,
        _dir: dir,
    }
}

impl Fixture {
    async fn run(&self, command: &str) -> Arc<RecordingContext> {
        let ctx = Arc::new(RecordingContext::new(GUILD, PLAYER, "Nana"));
        self.registry
            .dispatch(self.state.clone(), ctx.clone(), command)
            .await
            .expect("dispatch");
        ctx
    }
}

#[tokio::test]
async fn a_game_ships_the_result_clip_and_records_the_outcome() {
    let fx = fixture();

    let ctx = fx.run("janken rock").await;
    let sent = ctx.sent();
    assert_eq!(sent.len(), 1, "one reply expected, got {sent:?}");
    let Sent::File(path, filename) = &sent[0] else {
        panic!("expected the result clip, got {sent:?}");
    };
    assert!(filename.ends_with(".mp4"));
    assert!(path.exists(), "clip must be mirrored to disk");

    assert_eq!(fx.state.ledger.all("7").await.len(), 1);
    // The ledger document was synced to the store.
    assert!(fx.store.bytes("janken-data/records.json").is_some());
}

#[tokio::test]
async fn the_day_limit_blocks_a_second_game() {
    let fx = fixture();
    fx.run("janken scissors").await;

    let ctx = fx.run("janken paper").await;
    assert_eq!(
        ctx.texts(),
        vec!["You already played today. Come back tomorrow!".to_string()]
    );
    assert_eq!(fx.state.ledger.all("7").await.len(), 1);
}

#[tokio::test]
async fn the_short_alias_reaches_the_same_handler() {
    let fx = fixture();
    let ctx = fx.run("jk rock").await;
    assert!(matches!(ctx.sent().as_slice(), [Sent::File(_, _)]));
}

#[tokio::test]
async fn record_reports_totals_and_range_errors() {
    let fx = fixture();
    fx.run("janken rock").await;

    let ctx = fx.run("janken record").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected a record card, got {sent:?}");
    };
    assert_eq!(card.title, "Nana's janken record");
    assert_eq!(card.fields.len(), 1);

    let ctx = fx.run("janken record bogus").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected a card, got {sent:?}");
    };
    assert_eq!(card.fields[0].name, "'bogus' is not a valid record range.");

    let ctx = fx.run("janken record 10").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected a card, got {sent:?}");
    };
    assert_eq!(
        card.fields[0].name,
        "That range is outside your record history."
    );
}

#[tokio::test]
async fn record_on_an_empty_ledger_shows_zero_totals() {
    let fx = fixture();
    let ctx = fx.run("janken record").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected a card, got {sent:?}");
    };
    assert_eq!(card.description.as_deref(), Some("0 wins, 0 losses, 0 draws (0.0% win rate)"));
    assert!(card.fields.is_empty());
}

//! Player commands through the dispatcher: playback, queueing, search.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use hibiki_bot::dispatch::CommandRegistry;
use hibiki_bot::locale::{Locale, LocaleStore};
use hibiki_bot::modules;
use hibiki_bot::search::{Music, MusicSearcher};
use hibiki_bot::state::{AppState, FEATURES};
use hibiki_bot::testing::{offline_state, InMemoryStore, RecordingContext, Sent};

const GUILD: u64 = 42;
const USER: u64 = 7;

fn music(id: &str, title: &str) -> Music {
    Music {
        title: title.to_string(),
        authors: vec!["Aria".to_string()],
        alias: String::new(),
        id: id.to_string(),
    }
}

struct Fixture {
    state: Arc<AppState>,
    registry: CommandRegistry,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = InMemoryStore::default();
    store.insert(
        "server-conf/42.json",
        br#"{"AdminID":"7","Locale":"none","Janken":{"Limit":true}}"#.to_vec(),
    );
    for id in ["ab01", "ab02"] {
        let (author, code) = Music::split_id(id).expect("well-formed id");
        store.insert(
            format!("player-resource/{author}/{code}/resource.webm"),
            b"webm".to_vec(),
        );
    }

    let mut state = offline_state(Arc::new(store), dir.path());
    state.locales =
        LocaleStore::load(Path::new("locales"), &FEATURES).expect("shipped locale files load");
    let mut catalogue = HashMap::new();
    catalogue.insert(
        Locale::English,
        vec![music("ab01", "Morning Bell"), music("ab02", "Evening Bell")],
    );
    state.searcher = MusicSearcher::from_catalogue(catalogue);
    let registry =
        CommandRegistry::build(modules::command_groups(&state.locales), modules::fallback_handler())
            .expect("registry");
    Fixture {
        state: Arc::new(state),
        registry,
        _dir: dir,
    }
}

impl Fixture {
    async fn run(&self, command: &str) -> Arc<RecordingContext> {
        let ctx = Arc::new(RecordingContext::new(GUILD, USER, "Nana"));
        self.registry
            .dispatch(self.state.clone(), ctx.clone(), command)
            .await
            .expect("dispatch");
        ctx
    }
}

#[tokio::test]
async fn play_on_an_idle_queue_delivers_immediately() {
    let fx = fixture();

    let ctx = fx.run("player play ab01").await;
    let sent = ctx.sent();
    assert_eq!(sent.len(), 2, "card then file, got {sent:?}");
    let Sent::Card(card) = &sent[0] else {
        panic!("expected the announce card, got {sent:?}");
    };
    assert_eq!(card.title, "Now playing: Morning Bell");
    assert_eq!(
        card.thumbnail_url.as_deref(),
        Some("https://s3-test-region-1.amazonaws.com/test-bucket/player-resource/ab/01/thumbnail.webp")
    );
    let Sent::File(path, filename) = &sent[1] else {
        panic!("expected the resource file, got {sent:?}");
    };
    assert!(filename.ends_with(".webm"));
    assert!(path.exists());
    // Delivered item was popped.
    assert!(fx.state.queues.is_empty(GUILD));
}

#[tokio::test]
async fn play_on_a_busy_queue_only_enqueues() {
    let fx = fixture();
    fx.state.queues.add(GUILD, music("ab01", "Morning Bell"));

    let ctx = fx.run("player play ab02").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected the queue card, got {sent:?}");
    };
    assert_eq!(card.title, "Queued: Evening Bell");
    assert_eq!(fx.state.queues.all(GUILD).expect("queue").len(), 2);
}

#[tokio::test]
async fn unknown_ids_are_rejected() {
    let fx = fixture();
    let ctx = fx.run("player play zz99").await;
    assert_eq!(ctx.texts(), vec!["'zz99' is not a valid music id.".to_string()]);
    let ctx = fx.run("player play").await;
    assert_eq!(ctx.texts(), vec!["'' is not a valid music id.".to_string()]);
}

#[tokio::test]
async fn queue_listing_pages_and_validates() {
    let fx = fixture();

    let ctx = fx.run("player queue").await;
    assert_eq!(ctx.texts(), vec!["There is no active queue.".to_string()]);

    fx.state.queues.add(GUILD, music("ab01", "Morning Bell"));
    fx.state.queues.add(GUILD, music("ab02", "Evening Bell"));

    let ctx = fx.run("player queue").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected the queue card, got {sent:?}");
    };
    assert_eq!(card.title, "Current queue");
    assert_eq!(card.description.as_deref(), Some("2 item(s), page 1"));
    assert_eq!(card.fields.len(), 2);
    assert_eq!(card.fields[0].name, "Morning Bell");
    assert_eq!(card.fields[0].value, "by Aria [ab01]");

    let ctx = fx.run("player queue abc").await;
    assert_eq!(ctx.texts(), vec!["'abc' is not a valid page.".to_string()]);
}

#[tokio::test]
async fn search_ranks_and_paginates() {
    let fx = fixture();

    let ctx = fx.run("player search bell").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected the search card, got {sent:?}");
    };
    assert_eq!(card.title, "Search results for 'bell'");
    assert_eq!(card.fields.len(), 2);

    let ctx = fx.run("player search bell 2").await;
    let sent = ctx.sent();
    let Sent::Card(card) = &sent[0] else {
        panic!("expected the search card, got {sent:?}");
    };
    assert_eq!(card.description.as_deref(), Some("2 result(s), page 2"));
    assert_eq!(card.fields.len(), 1);
    assert_eq!(card.fields[0].name, "No results.");

    let ctx = fx.run("player search bell 0").await;
    assert_eq!(ctx.texts(), vec!["'0' is not a valid page.".to_string()]);
}

#[tokio::test]
async fn loop_toggles_and_requires_a_queue() {
    let fx = fixture();

    let ctx = fx.run("player loop").await;
    assert_eq!(ctx.texts(), vec!["There is no active queue.".to_string()]);

    fx.state.queues.add(GUILD, music("ab01", "Morning Bell"));
    let ctx = fx.run("player loop").await;
    assert_eq!(ctx.texts(), vec!["Loop enabled.".to_string()]);
    assert!(fx.state.queues.is_loop(GUILD));
    let ctx = fx.run("player loop").await;
    assert_eq!(ctx.texts(), vec!["Loop disabled.".to_string()]);
}

#[tokio::test]
async fn leave_drops_the_whole_queue() {
    let fx = fixture();
    fx.state.queues.add(GUILD, music("ab01", "Morning Bell"));

    let ctx = fx.run("player leave").await;
    assert_eq!(
        ctx.texts(),
        vec!["Stopped playback and cleared the queue.".to_string()]
    );
    assert!(!fx.state.queues.is_exist(GUILD));
}

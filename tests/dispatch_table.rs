//! Dispatch-table construction against the shipped locale resources.

use std::path::Path;
use std::sync::Arc;

use hibiki_bot::dispatch::CommandRegistry;
use hibiki_bot::guild::MSG_NOT_REGISTERED;
use hibiki_bot::locale::LocaleStore;
use hibiki_bot::modules;
use hibiki_bot::state::{AppState, FEATURES};
use hibiki_bot::testing::{offline_state, InMemoryStore, RecordingContext, Sent};

fn shipped_locales() -> LocaleStore {
    LocaleStore::load(Path::new("locales"), &FEATURES).expect("shipped locale files load")
}

fn registry(locales: &LocaleStore) -> CommandRegistry {
    CommandRegistry::build(modules::command_groups(locales), modules::fallback_handler())
        .expect("no name collisions in shipped commands")
}

fn state(dir: &Path) -> Arc<AppState> {
    let mut state = offline_state(Arc::new(InMemoryStore::default()), dir);
    state.locales = shipped_locales();
    Arc::new(state)
}

#[test]
fn shipped_commands_flatten_to_expected_names() {
    let locales = shipped_locales();
    let names = registry(&locales).names();

    for expected in [
        "dev.ping",
        "dev.register",
        "dev.locale",
        "dev.get_all_locales",
        "dev.janken.limit",
        "janken",
        "jk",
        "가위바위보",
        "player",
        "pl",
        "플레이어",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }
}

#[tokio::test]
async fn dispatch_is_case_insensitive() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state(dir.path());
    let registry = registry(&state.locales);

    let ctx = Arc::new(RecordingContext::new(42, 7, "Nana"));
    registry
        .dispatch(state, ctx.clone(), "JANKEN rock")
        .await
        .expect("dispatch");
    // The handler ran (and found the guild unregistered) instead of the
    // fallback help card.
    assert_eq!(ctx.texts(), vec![MSG_NOT_REGISTERED.to_string()]);
}

#[tokio::test]
async fn unknown_commands_fall_back_to_help() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state(dir.path());
    let registry = registry(&state.locales);

    let ctx = Arc::new(RecordingContext::new(42, 7, "Nana"));
    registry
        .dispatch(state, ctx.clone(), "no.such.command")
        .await
        .expect("dispatch");

    let sent = ctx.sent();
    assert_eq!(sent.len(), 1);
    let Sent::Card(card) = &sent[0] else {
        panic!("expected a help card, got {sent:?}");
    };
    assert_eq!(card.title, "Available commands");
    assert!(!card.fields.is_empty());
}

#[tokio::test]
async fn empty_input_also_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state(dir.path());
    let registry = registry(&state.locales);

    let ctx = Arc::new(RecordingContext::new(42, 7, "Nana"));
    registry
        .dispatch(state, ctx.clone(), "   ")
        .await
        .expect("dispatch");
    assert!(matches!(ctx.sent().as_slice(), [Sent::Card(_)]));
}

//! Media playback commands.
//!
//! Like janken, the top-level name and every subcommand synonym come from
//! the feature's locale files. Playback itself is delivery of the catalogue
//! resource file into the chat; queue state lives in [`MusicQueues`].

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::{ChatContext, MessageCard};
use crate::dispatch::{handler, CommandGroup, LeafSpec};
use crate::guild;
use crate::locale::{LocaleProperties, LocaleStore};
use crate::search::Music;
use crate::state::AppState;

const PAGE_SIZE: usize = 9;

/// The player command group; name and aliases come from the locale files.
#[must_use]
pub fn command_group(locales: &LocaleStore) -> CommandGroup {
    let (name, aliases) = locales.command_info("player");
    CommandGroup {
        namespace: String::new(),
        qualify: false,
        commands: vec![LeafSpec {
            name,
            aliases,
            handler: handler(handle),
        }],
        children: vec![],
    }
}

async fn handle(
    state: Arc<AppState>,
    ctx: Arc<dyn ChatContext>,
    args: Vec<String>,
) -> Result<()> {
    let Some(conf) = guild::load(&state, ctx.as_ref(), false).await? else {
        return Ok(());
    };
    let locale = state.locales.properties("player", conf.locale());
    let sub = args.first().map(|s| s.to_lowercase()).unwrap_or_default();

    if locale.list("Command_Play").contains(&sub) {
        play(&state, ctx.as_ref(), &locale, &args).await
    } else if locale.list("Command_Leave").contains(&sub) {
        leave(&state, ctx.as_ref(), &locale).await
    } else if locale.list("Command_Search").contains(&sub) {
        search_command(&state, ctx.as_ref(), &locale, &args).await
    } else if locale.list("Command_Loop").contains(&sub) {
        loop_command(&state, ctx.as_ref(), &locale).await
    } else if locale.list("Command_Queue").contains(&sub) {
        queue_command(&state, ctx.as_ref(), &locale, &args).await
    } else {
        crate::modules::send_help(ctx.as_ref(), &locale).await
    }
}

async fn play(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
    args: &[String],
) -> Result<()> {
    let id = args.get(1).map(String::as_str).unwrap_or_default();
    let Some(music) = state.searcher.find(locale.locale(), id) else {
        return ctx.say(&locale.format("Play_InvalidID", &[id])).await;
    };

    let guild = ctx.guild_id();
    let was_idle = state.queues.is_empty(guild);
    state.queues.add(guild, music.clone());

    if was_idle {
        play_next(state, ctx, locale).await
    } else {
        let card = music_card(
            state,
            locale.format("Play_AddQueue", &[&music.title]),
            locale,
            &music,
            "Queue_Field",
        );
        ctx.send_card(card).await
    }
}

/// Deliver the front of the queue: announce it, ship the resource file, then
/// advance the queue (re-appending under loop).
async fn play_next(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
) -> Result<()> {
    let guild = ctx.guild_id();
    let Some(music) = state.queues.peek(guild)? else {
        return Ok(());
    };
    let Some(key) = Music::resource_key(&state.settings, &music.id) else {
        return ctx.say(&locale.format("Play_InvalidID", &[&music.id])).await;
    };
    let path = state.cache.read_to_path(&key).await?;

    let card = music_card(
        state,
        locale.format("Play_PlayNext", &[&music.title]),
        locale,
        &music,
        "Queue_Field",
    );
    ctx.send_card(card).await?;
    ctx.send_file(&path, &format!("{}.webm", Uuid::new_v4())).await?;
    state.queues.pop(guild)?;
    Ok(())
}

async fn leave(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
) -> Result<()> {
    state.queues.free(ctx.guild_id());
    ctx.say(&locale.text("Leave_Done")).await
}

async fn search_command(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
    args: &[String],
) -> Result<()> {
    // A trailing numeric token (after at least one query word) is the page.
    let mut terms: &[String] = args.get(1..).unwrap_or(&[]);
    let mut page = 1;
    if terms.len() >= 2 {
        if let Some(last) = terms.last() {
            if let Ok(n) = last.parse::<usize>() {
                if n == 0 {
                    return ctx.say(&locale.format("Page_Invalid", &[last])).await;
                }
                page = n;
                terms = &terms[..terms.len() - 1];
            }
        }
    }
    let query = terms.join(" ");

    let hits = state.searcher.search(&query, locale.locale());
    let listing = Listing {
        title: locale.format("Search_Title", &[&query]),
        subtitle: locale.format(
            "Search_Subtitle",
            &[&hits.len().to_string(), &page.to_string()],
        ),
        field_key: "Search_Field",
        else_key: "Search_Else",
    };
    ctx.send_card(listing_card(state, locale, listing, &hits, page))
        .await
}

async fn queue_command(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
    args: &[String],
) -> Result<()> {
    let guild = ctx.guild_id();
    if !state.queues.is_exist(guild) {
        return ctx.say(&locale.text("Queue_NotExist")).await;
    }
    let page = match args.get(1) {
        None => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return ctx.say(&locale.format("Page_Invalid", &[raw])).await,
        },
    };

    let items = state.queues.all(guild)?;
    let listing = Listing {
        title: locale.text("Queue_Title"),
        subtitle: locale.format(
            "Queue_Subtitle",
            &[&items.len().to_string(), &page.to_string()],
        ),
        field_key: "Queue_Field",
        else_key: "Queue_Else",
    };
    ctx.send_card(listing_card(state, locale, listing, &items, page))
        .await
}

async fn loop_command(
    state: &AppState,
    ctx: &dyn ChatContext,
    locale: &LocaleProperties<'_>,
) -> Result<()> {
    let guild = ctx.guild_id();
    if !state.queues.is_exist(guild) {
        return ctx.say(&locale.text("Loop_NotExist")).await;
    }
    let looping = !state.queues.is_loop(guild);
    state.queues.set_loop(guild, looping);
    let key = if looping { "Loop_True" } else { "Loop_False" };
    ctx.say(&locale.text(key)).await
}

/// One-entry card: the entry's title plus its metadata line and thumbnail.
fn music_card(
    state: &AppState,
    title: String,
    locale: &LocaleProperties<'_>,
    music: &Music,
    field_key: &str,
) -> MessageCard {
    let mut card = MessageCard::new(title).field(
        music.title.clone(),
        locale.format(field_key, &[&music.authors.join(", "), &music.id]),
    );
    if let Some(key) = Music::thumbnail_key(&state.settings, &music.id) {
        card = card.thumbnail(state.cache.url_for(&key));
    }
    card
}

/// Heading and resource keys of a paged listing
struct Listing {
    title: String,
    subtitle: String,
    field_key: &'static str,
    else_key: &'static str,
}

/// Paged listing card: one field per entry on the requested page, or the
/// `else` resource when the page is empty.
fn listing_card(
    state: &AppState,
    locale: &LocaleProperties<'_>,
    listing: Listing,
    items: &[Music],
    page: usize,
) -> MessageCard {
    let mut card = MessageCard::new(listing.title).description(listing.subtitle);
    let slice = page_slice(items, page);
    if slice.is_empty() {
        return card.field(locale.text(listing.else_key), String::new());
    }
    for music in slice {
        card = card.field(
            music.title.clone(),
            locale.format(listing.field_key, &[&music.authors.join(", "), &music.id]),
        );
    }
    if let Some(first) = slice.first() {
        if let Some(key) = Music::thumbnail_key(&state.settings, &first.id) {
            card = card.thumbnail(state.cache.url_for(&key));
        }
    }
    card
}

/// Items of a 1-based page, [`PAGE_SIZE`] per page. Out-of-range pages are
/// empty, not an error.
fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    items.get(start..end).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slice_pages_are_one_based() {
        let items: Vec<u32> = (0..20).collect();
        assert_eq!(page_slice(&items, 1), (0..9).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 2), (9..18).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 3), (18..20).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 4), &[] as &[u32]);
    }

    #[test]
    fn page_slice_handles_short_lists() {
        let items = [1, 2, 3];
        assert_eq!(page_slice(&items, 1), &[1, 2, 3]);
        assert_eq!(page_slice(&items, 2), &[] as &[i32]);
        assert_eq!(page_slice::<i32>(&[], 1), &[] as &[i32]);
    }
}

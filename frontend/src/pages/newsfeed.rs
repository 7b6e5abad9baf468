use std::collections::BTreeSet;

use leptos::*;
use shared::config::BoardConfig;
use shared::feed::{paginate, FeedComposer, FeedFilter, FeedItem};
use shared::{Announcement, CalendarEvent};

use crate::components::feed_card::FeedCard;
use crate::components::feed_filters::{CategoryOption, FeedFilters};
use crate::components::loading::Loading;
use crate::components::pagination::Pagination;
use crate::components::source_error::SourceError;
use crate::state::content::use_content_sources;
use crate::state::server_time::use_server_time;

fn category_options(announcements: &[Announcement], events: &[CalendarEvent]) -> Vec<CategoryOption> {
    let from_announcements = announcements
        .iter()
        .filter_map(|a| Some((a.category_id?, a.category_name.clone()?)));
    let from_events = events
        .iter()
        .filter_map(|e| Some((e.category_id?, e.category_name.clone()?)));

    let mut seen = BTreeSet::new();
    let mut options: Vec<CategoryOption> = from_announcements
        .chain(from_events)
        .filter(|(id, _)| seen.insert(*id))
        .map(|(id, name)| CategoryOption { id, name })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options
}

fn grade_options(announcements: &[Announcement]) -> Vec<i32> {
    announcements
        .iter()
        .filter_map(|a| a.grade_level)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn render_track(items: Vec<FeedItem>) -> View {
    items
        .into_iter()
        .map(|item| view! { <FeedCard item=item /> })
        .collect_view()
}

#[component]
pub fn NewsfeedPage() -> impl IntoView {
    let config = expect_context::<BoardConfig>();
    let time = use_server_time();
    let sources = use_content_sources();

    let filter = create_rw_signal(FeedFilter::default());
    let page = create_rw_signal(1usize);
    let per_page = config.feed_page_size;

    let announcements = sources.announcements.state();
    let events = sources.events.state();

    let feed = create_memo(move |_| {
        let composer = FeedComposer::new(time.now(), time.tz()).with_filter(filter.get());
        announcements.with(|a| events.with(|e| composer.compose(&a.items, &e.items)))
    });

    // Back to the first page whenever the filter changes
    create_effect(move |_| {
        filter.track();
        page.set(1);
    });

    let regular_page = create_memo(move |_| {
        feed.with(|f| paginate(&f.regular_track, page.get(), per_page))
    });

    let categories = Signal::derive(move || {
        announcements.with(|a| events.with(|e| category_options(&a.items, &e.items)))
    });
    let grades = Signal::derive(move || announcements.with(|a| grade_options(&a.items)));

    let loading = {
        let sources = sources.clone();
        move || sources.announcements.is_loading() || sources.events.is_loading()
    };
    let first_load = {
        let loading = loading.clone();
        move || loading() && feed.with(|f| f.is_empty())
    };

    let announcement_error = Signal::derive(move || announcements.with(|s| s.error.clone()));
    let event_error = Signal::derive(move || events.with(|s| s.error.clone()));
    let retry_announcements = {
        let source = sources.announcements.clone();
        Callback::new(move |_: ()| source.refresh())
    };
    let retry_events = {
        let source = sources.events.clone();
        Callback::new(move |_: ()| source.refresh())
    };

    view! {
        <div class="page-header">
            <h1>"Newsfeed"</h1>
            <Show when=loading fallback=|| ()>
                <span class="refreshing">"Refreshing…"</span>
            </Show>
        </div>

        <FeedFilters filter=filter categories=categories grades=grades />

        <SourceError source="announcements" error=announcement_error on_retry=retry_announcements />
        <SourceError source="calendar events" error=event_error on_retry=retry_events />

        <Show when=first_load.clone() fallback=|| ()>
            <Loading label="Loading the board…" />
        </Show>

        <Show when=move || feed.with(|f| !f.alert_track.is_empty()) fallback=|| ()>
            <section class="feed-track feed-track-alerts">
                <h2>"Alerts"</h2>
                {move || render_track(feed.with(|f| f.alert_track.clone()))}
            </section>
        </Show>

        <section class="feed-track">
            {move || {
                let current = regular_page.get();
                if current.items.is_empty() && feed.with(|f| f.alert_track.is_empty()) {
                    if first_load() {
                        view! {}.into_view()
                    } else {
                        view! {
                            <div class="card empty-state">
                                <p>"Nothing on the board right now."</p>
                            </div>
                        }
                        .into_view()
                    }
                } else {
                    render_track(current.items)
                }
            }}
        </section>

        <Pagination page=page total_pages=Signal::derive(move || regular_page.with(|p| p.total_pages)) />
    }
}

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use leptos::*;
use shared::config::BoardConfig;
use shared::content::{ListQuery, SourceState};
use shared::events::EventBus;
use shared::{Announcement, BoardEventKind, CalendarEvent, ListResponse};

use crate::api::ApiClient;

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<ListResponse<T>, String>>>>;
type Fetcher<T> = Rc<dyn Fn(ListQuery, bool) -> FetchFuture<T>>;

/// One paginated list endpoint with its loading, error and data state.
pub struct ContentSource<T: 'static> {
    state: RwSignal<SourceState<T>>,
    fetcher: Fetcher<T>,
}

impl<T: 'static> Clone for ContentSource<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<T: 'static> ContentSource<T> {
    pub fn new<F>(fetcher: F) -> Self
    where
        F: Fn(ListQuery, bool) -> FetchFuture<T> + 'static,
    {
        Self {
            state: create_rw_signal(SourceState::new()),
            fetcher: Rc::new(fetcher),
        }
    }

    pub fn state(&self) -> ReadSignal<SourceState<T>> {
        self.state.read_only()
    }

    pub fn fetch(&self, query: ListQuery) {
        self.load(query, false);
    }

    /// Re-issue the last query, bypassing caches.
    pub fn refresh(&self) {
        match self.state.with_untracked(|s| s.last_query().cloned()) {
            Some(query) => self.load(query, true),
            None => log::debug!("Refresh requested before the first fetch"),
        }
    }

    fn load(&self, query: ListQuery, fresh: bool) {
        self.state.update(|s| s.begin(query.clone()));
        let request = (self.fetcher)(query, fresh);
        let state = self.state;
        wasm_bindgen_futures::spawn_local(async move {
            let result = request.await;
            state.update(|s| s.resolve(result));
        });
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.loading)
    }

    pub fn error(&self) -> Option<String> {
        self.state.with(|s| s.error.clone())
    }

    /// Loaded successfully at least once and not currently failing.
    pub fn is_ready(&self) -> bool {
        self.state
            .with(|s| s.last_query().is_some() && !s.loading && !s.has_error())
    }
}

/// Both feed sources. They load and fail independently.
#[derive(Clone)]
pub struct ContentSources {
    pub announcements: ContentSource<Announcement>,
    pub events: ContentSource<CalendarEvent>,
}

impl ContentSources {
    pub fn refresh_all(&self) {
        self.announcements.refresh();
        self.events.refresh();
    }
}

/// Create both sources, start the initial fetches and re-pull on content
/// change events from the push channel.
pub fn provide_content_sources(api: ApiClient, bus: &EventBus, config: &BoardConfig) -> ContentSources {
    let announcements_api = api.clone();
    let announcements = ContentSource::new(move |query: ListQuery, fresh| {
        let api = announcements_api.clone();
        Box::pin(async move { api.list_announcements(&query, fresh).await }) as FetchFuture<Announcement>
    });

    let events = ContentSource::new(move |query: ListQuery, fresh| {
        let api = api.clone();
        Box::pin(async move { api.list_calendar_events(&query, fresh).await }) as FetchFuture<CalendarEvent>
    });

    let sources = ContentSources {
        announcements,
        events,
    };

    let query = ListQuery::all(config.fetch_page_size);
    sources.announcements.fetch(query.clone());
    sources.events.fetch(query);

    let on_change = sources.clone();
    let subscriptions = bus.subscribe_all(&BoardEventKind::CONTENT_CHANGES, move |event| {
        log::debug!("{} received, refreshing feed", event.kind().as_str());
        on_change.refresh_all();
    });
    on_cleanup(move || drop(subscriptions));

    provide_context(sources.clone());
    sources
}

pub fn use_content_sources() -> ContentSources {
    expect_context::<ContentSources>()
}

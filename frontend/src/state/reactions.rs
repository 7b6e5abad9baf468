use leptos::*;
use shared::events::EventBus;
use shared::reactions::{ReactionState, ReactionStore, RemoteReaction};
use shared::{BoardEventKind, ContentKey};

use super::content::ContentSources;
use crate::api::{ApiClient, AuthState};

/// Likes for everything on screen, with optimistic toggling.
#[derive(Clone)]
pub struct Reactions {
    store: RwSignal<ReactionStore>,
    api: ApiClient,
}

impl Reactions {
    pub fn state(&self, key: ContentKey) -> Option<ReactionState> {
        self.store.with(|store| store.get(key))
    }

    pub fn is_pending(&self, key: ContentKey) -> bool {
        self.store.with(|store| store.is_pending(key))
    }

    /// Flip the like immediately, then confirm with the server. A failure
    /// restores the previous values.
    pub fn toggle(&self, key: ContentKey, currently_liked: bool) {
        let started = self
            .store
            .try_update(|store| store.begin_toggle(key, currently_liked))
            .flatten();
        if started.is_none() {
            return;
        }

        let api = self.api.clone();
        let store = self.store;
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = api.toggle_like(key).await.map(|_| ());
            store.update(|store| store.settle(key, outcome));
        });
    }
}

pub fn provide_reactions(
    api: ApiClient,
    bus: &EventBus,
    sources: &ContentSources,
    auth: AuthState,
) -> Reactions {
    let store = create_rw_signal(ReactionStore::new());

    // Reseed whenever a source delivers a new list
    let announcements = sources.announcements.state();
    create_effect(move |_| {
        announcements.with(|s| store.update(|store| store.seed(s.items.iter())));
    });
    let events = sources.events.state();
    create_effect(move |_| {
        events.with(|s| store.update(|store| store.seed(s.items.iter())));
    });

    let subscriptions = bus.subscribe_all(&BoardEventKind::REACTIONS, move |event| {
        if let Some(update) = RemoteReaction::from_event(event) {
            let viewer = auth.viewer.get_untracked();
            store.update(|store| store.apply_remote(&update, viewer.as_ref()));
        }
    });
    on_cleanup(move || drop(subscriptions));

    let reactions = Reactions { store, api };
    provide_context(reactions.clone());
    reactions
}

pub fn use_reactions() -> Reactions {
    expect_context::<Reactions>()
}

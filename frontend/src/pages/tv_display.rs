use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Interval;
use leptos::*;
use shared::config::BoardConfig;
use shared::events::EventBus;
use shared::feed::{FeedComposer, FeedContent};
use shared::tv::{build_playlist, CommandCursor, KioskView, TvPlayback};
use shared::{BoardEvent, BoardEventKind};

use crate::components::tv_slide::{EmergencySlide, TvSlide};
use crate::state::content::use_content_sources;
use crate::state::server_time::use_server_time;
use crate::state::tv::{load_command, load_settings, use_tv_selection, PlaybackController};
use crate::utils::format_datetime;

/// What the kiosk shows, detached from the playback borrow.
#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Emergency(String),
    Slide(FeedContent),
    Empty,
}

fn screen_for(playback: &TvPlayback, playlist: &[FeedContent]) -> Screen {
    match playback.kiosk_view(playlist.len()) {
        KioskView::Emergency(message) => Screen::Emergency(message.to_string()),
        KioskView::Slide(index) => playlist
            .get(index)
            .cloned()
            .map_or(Screen::Empty, Screen::Slide),
        KioskView::Empty => Screen::Empty,
    }
}

fn browser_online() -> bool {
    web_sys::window().map_or(true, |w| w.navigator().on_line())
}

/// Kiosk display. Controlled from the TV control page through local storage
/// and from the server through emergency push events.
#[component]
pub fn TvDisplayPage() -> impl IntoView {
    let config = expect_context::<BoardConfig>();
    let bus = expect_context::<EventBus>();
    let time = use_server_time();
    let sources = use_content_sources();
    let selection = use_tv_selection();

    let announcements = sources.announcements.state();
    let events = sources.events.state();

    let candidates = create_memo(move |_| {
        let composer = FeedComposer::new(time.now(), time.tz());
        announcements.with(|a| events.with(|e| composer.tv_candidates(&a.items, &e.items)))
    });

    let stored_settings = load_settings();
    let slide_count = create_rw_signal(0usize);
    let controller = PlaybackController::new(stored_settings.clone(), slide_count.into());
    let playback = controller.playback();

    let playlist = {
        let selection = selection.clone();
        create_memo(move |_| {
            let chosen = selection.selection();
            candidates.with(|c| playback.with(|p| build_playlist(&chosen, c, p.settings())))
        })
    };
    create_effect(move |_| slide_count.set(playlist.with(|p| p.len())));

    // Poll shared storage for changes made by the control panel
    let cursor = Rc::new(Cell::new(CommandCursor::starting_at(load_command().as_ref())));
    let last_settings = Rc::new(RefCell::new(stored_settings));
    let poll = {
        let controller = controller.clone();
        let selection = selection.clone();
        let sources = sources.clone();
        Interval::new(config.kiosk_poll_ms.max(250), move || {
            selection.reload();

            let settings = load_settings();
            if *last_settings.borrow() != settings {
                if let Err(e) = controller.replace_settings(settings.clone()) {
                    log::warn!("Ignoring TV settings: {}", e);
                }
                *last_settings.borrow_mut() = settings;
            }

            if let Some(command) = load_command() {
                let mut seen = cursor.get();
                let action = seen.accept(&command);
                cursor.set(seen);
                if let Some(action) = action {
                    log::info!("Applying TV command {:?} (#{})", action, command.seq);
                    if controller.apply(action).is_some() {
                        sources.refresh_all();
                    }
                }
            }

            controller.set_online(browser_online());
        })
    };

    let emergency = {
        let controller = controller.clone();
        bus.subscribe(BoardEventKind::EmergencyBroadcast, move |event| {
            if let BoardEvent::EmergencyBroadcast { message } = event {
                controller.show_emergency(message);
            }
        })
    };
    let cleared = {
        let controller = controller.clone();
        bus.subscribe(BoardEventKind::EmergencyCleared, move |_| controller.clear_emergency())
    };

    on_cleanup(move || {
        drop(poll);
        drop(emergency);
        drop(cleared);
    });

    let screen = create_memo(move |_| playback.with(|p| playlist.with(|l| screen_for(p, l))));

    view! {
        <div class="tv-display">
            {move || match screen.get() {
                Screen::Emergency(message) => view! { <EmergencySlide message=message /> }.into_view(),
                Screen::Slide(content) => view! { <TvSlide content=content /> }.into_view(),
                Screen::Empty => view! {
                    <div class="tv-slide tv-empty">
                        <h1>"School Bulletin Board"</h1>
                        <p>"No content selected for display."</p>
                    </div>
                }
                .into_view(),
            }}
            <footer class="tv-status">
                <span>{move || format_datetime(time.now(), time.tz())}</span>
                <span>
                    {move || {
                        let total = playlist.with(|l| l.len());
                        playback.with(|p| {
                            let state = if p.is_playing() { "Playing" } else { "Paused" };
                            if total == 0 {
                                state.to_string()
                            } else {
                                format!("{} · {}/{}", state, p.current_index() % total + 1, total)
                            }
                        })
                    }}
                </span>
                <span class="tv-online" class:tv-offline=move || playback.with(|p| !p.is_online())>
                    {move || if playback.with(|p| p.is_online()) { "Online" } else { "Offline" }}
                </span>
            </footer>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::tv::TvSettings;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn slide(id: i64) -> FeedContent {
        FeedContent::Announcement(
            serde_json::from_value(serde_json::json!({ "id": id, "title": "Slide" })).unwrap(),
        )
    }

    #[wasm_bindgen_test]
    fn test_screen_prefers_emergency() {
        let mut playback = TvPlayback::new(TvSettings::default());
        let pending = TvPlayback::request_emergency("Lockdown drill").unwrap();
        playback.confirm_emergency(pending);

        assert_eq!(
            screen_for(&playback, &[slide(1)]),
            Screen::Emergency("Lockdown drill".to_string())
        );
    }

    #[wasm_bindgen_test]
    fn test_screen_follows_index() {
        let mut playback = TvPlayback::new(TvSettings::default());
        let playlist = vec![slide(1), slide(2)];
        assert!(playback.play(playlist.len()));
        playback.next(playlist.len());

        assert_eq!(screen_for(&playback, &playlist), Screen::Slide(slide(2)));
        assert_eq!(screen_for(&playback, &[]), Screen::Empty);
    }
}

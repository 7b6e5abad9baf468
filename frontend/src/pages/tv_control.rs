use chrono_tz::Tz;
use leptos::*;
use shared::feed::{FeedComposer, FeedContent};
use shared::tv::{build_playlist, PendingBroadcast, TvAction, TvPlayback, TvSettings};
use shared::ContentKind;

use crate::api::{ApiClient, AuthState};
use crate::components::emergency_panel::EmergencyPanel;
use crate::components::source_error::SourceError;
use crate::state::content::use_content_sources;
use crate::state::server_time::use_server_time;
use crate::state::tv::{load_settings, save_settings, send_command, use_tv_selection};
use crate::utils::format_event_dates;

/// A row in one of the candidate lists
#[derive(Clone, PartialEq)]
struct CandidateRow {
    id: i64,
    kind: ContentKind,
    title: String,
    detail: String,
}

fn candidate_rows(content: &[FeedContent], tz: Tz) -> Vec<CandidateRow> {
    content
        .iter()
        .map(|item| {
            let key = item.key();
            let detail = match item {
                FeedContent::Announcement(a) => a.category_name.clone().unwrap_or_default(),
                FeedContent::Event(e) => format_event_dates(e, tz),
            };
            CandidateRow {
                id: key.id,
                kind: key.kind,
                title: item.title().to_string(),
                detail,
            }
        })
        .collect()
}

/// The settings to publish for an emergency change: the last saved
/// settings with only the emergency fields replaced. `None` ends the
/// broadcast.
fn with_emergency(saved: &TvSettings, pending: Option<PendingBroadcast>) -> TvSettings {
    let mut playback = TvPlayback::new(saved.clone());
    match pending {
        Some(pending) => playback.confirm_emergency(pending),
        None => playback.clear_emergency(),
    }
    playback.settings().clone()
}

fn seconds_to_ms(value: &str) -> Option<u32> {
    let seconds: f64 = value.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1000.0).round() as u32)
}

#[component]
fn CandidateList(
    #[prop(into)] heading: String,
    #[prop(into)] rows: Signal<Vec<CandidateRow>>,
) -> impl IntoView {
    let selection = use_tv_selection();

    view! {
        <section class="card candidate-list">
            <h2>{heading}</h2>
            {move || {
                let rows = rows.get();
                if rows.is_empty() {
                    return view! { <p class="empty-state">"Nothing eligible right now."</p> }.into_view();
                }
                rows.into_iter()
                    .map(|row| {
                        let CandidateRow { id, kind, title, detail } = row;
                        let checked = {
                            let selection = selection.clone();
                            move || selection.is_selected(id, kind)
                        };
                        let selection = selection.clone();
                        view! {
                            <label class="candidate-row">
                                <input
                                    type="checkbox"
                                    prop:checked=checked
                                    on:change=move |_| {
                                        selection.toggle(id, kind);
                                    }
                                />
                                <span class="candidate-title">{title}</span>
                                <span class="candidate-detail">{detail}</span>
                            </label>
                        }
                    })
                    .collect_view()
            }}
        </section>
    }
}

#[component]
pub fn TvControlPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    view! {
        <Show
            when=move || auth.can_control_tv()
            fallback=|| view! { <div class="alert alert-error">"Only administrators can control the TV display."</div> }
        >
            <TvControlPanel />
        </Show>
    }
}

#[component]
fn TvControlPanel() -> impl IntoView {
    let api = expect_context::<ApiClient>();
    let time = use_server_time();
    let sources = use_content_sources();
    let selection = use_tv_selection();

    let announcements = sources.announcements.state();
    let events = sources.events.state();

    let candidates = create_memo(move |_| {
        let composer = FeedComposer::new(time.now(), time.tz());
        announcements.with(|a| events.with(|e| composer.tv_candidates(&a.items, &e.items)))
    });

    // Drop selections that stopped being eligible, but only against a
    // complete picture of both sources
    {
        let sources = sources.clone();
        let selection = selection.clone();
        create_effect(move |_| {
            if sources.announcements.is_ready() && sources.events.is_ready() {
                candidates.with(|c| selection.retain(c));
            }
        });
    }

    let announcement_rows = Signal::derive(move || {
        candidates.with(|c| {
            let content: Vec<FeedContent> = c
                .announcements
                .iter()
                .cloned()
                .map(FeedContent::Announcement)
                .collect();
            candidate_rows(&content, time.tz())
        })
    });
    let event_rows = Signal::derive(move || {
        candidates.with(|c| {
            let content: Vec<FeedContent> = c.events.iter().cloned().map(FeedContent::Event).collect();
            candidate_rows(&content, time.tz())
        })
    });

    // Local editor for the shared settings
    let editor = create_rw_signal(TvPlayback::new(load_settings()));
    let saved = create_rw_signal(editor.with_untracked(|p| p.settings().clone()));
    let interval_input = create_rw_signal(
        (editor.with_untracked(|p| p.settings().slide_interval_ms) / 1000).to_string(),
    );
    let status = create_rw_signal(Option::<String>::None);
    let error = create_rw_signal(Option::<String>::None);
    let busy = create_rw_signal(false);

    let playlist = {
        let selection = selection.clone();
        create_memo(move |_| {
            let chosen = selection.selection();
            candidates.with(|c| editor.with(|p| build_playlist(&chosen, c, p.settings())))
        })
    };

    let publish = move |settings: TvSettings| match save_settings(&settings) {
        Ok(()) => {
            saved.set(settings);
            Ok(())
        }
        Err(e) => {
            error.set(Some(e.clone()));
            Err(e)
        }
    };
    let persist = move || publish(editor.with_untracked(|p| p.settings().clone()));

    let command = move |action: TvAction| match send_command(action) {
        Ok(_) => {
            error.set(None);
            status.set(Some(format!("Sent {:?} to the display", action)));
        }
        Err(e) => error.set(Some(e)),
    };

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(interval_ms) = seconds_to_ms(&interval_input.get_untracked()) else {
            error.set(Some("Slide interval must be a number of seconds".to_string()));
            return;
        };
        let outcome = editor.try_update(|p| p.set_slide_interval(interval_ms));
        if let Some(Err(e)) = outcome {
            error.set(Some(e.to_string()));
            return;
        }
        if persist().is_ok() {
            error.set(None);
            status.set(Some("Display settings saved".to_string()));
        }
    };

    let on_confirm = {
        let api = api.clone();
        Callback::new(move |pending: PendingBroadcast| {
            let api = api.clone();
            busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match api.broadcast_emergency(pending.message()).await {
                    Ok(()) => {
                        editor.update(|p| p.confirm_emergency(pending.clone()));
                        let settings = saved.with_untracked(|s| with_emergency(s, Some(pending)));
                        if publish(settings).is_ok() {
                            status.set(Some("Emergency broadcast is on air".to_string()));
                        }
                    }
                    Err(e) => error.set(Some(format!("Broadcast failed: {}", e))),
                }
                busy.set(false);
            });
        })
    };

    let on_clear = Callback::new(move |_: ()| {
        let api = api.clone();
        busy.set(true);
        wasm_bindgen_futures::spawn_local(async move {
            match api.clear_emergency().await {
                Ok(()) => {
                    editor.update(|p| p.clear_emergency());
                    let settings = saved.with_untracked(|s| with_emergency(s, None));
                    if publish(settings).is_ok() {
                        status.set(Some("Emergency broadcast ended".to_string()));
                    }
                }
                Err(e) => error.set(Some(format!("Could not end broadcast: {}", e))),
            }
            busy.set(false);
        });
    });

    let active_message = Signal::derive(move || {
        editor.with(|p| {
            let settings = p.settings();
            settings
                .emergency_active
                .then(|| settings.emergency_message.clone())
        })
    });

    let count = {
        let selection = selection.clone();
        move || selection.count()
    };
    let clear_selection = selection.clone();

    let announcement_error = Signal::derive(move || announcements.with(|s| s.error.clone()));
    let event_error = Signal::derive(move || events.with(|s| s.error.clone()));
    let retry = {
        let sources = sources.clone();
        Callback::new(move |_: ()| sources.refresh_all())
    };

    view! {
        <div class="page-header">
            <h1>"TV display control"</h1>
            <a class="btn btn-outline" href="/tv" target="_blank">"Open display"</a>
        </div>

        {move || error.get().map(|e| view! { <div class="alert alert-error">{e}</div> })}
        {move || status.get().map(|s| view! { <div class="alert alert-success">{s}</div> })}

        <SourceError source="announcements" error=announcement_error on_retry=retry />
        <SourceError source="calendar events" error=event_error on_retry=retry />

        <EmergencyPanel
            active_message=active_message
            busy=busy
            on_confirm=on_confirm
            on_clear=on_clear
        />

        <section class="card playback-controls">
            <h2>"Playback"</h2>
            <div class="button-row">
                <button class="btn btn-primary" on:click=move |_| command(TvAction::Play)>"Play"</button>
                <button class="btn btn-outline" on:click=move |_| command(TvAction::Pause)>"Pause"</button>
                <button class="btn btn-outline" on:click=move |_| command(TvAction::Previous)>"Previous"</button>
                <button class="btn btn-outline" on:click=move |_| command(TvAction::Next)>"Next"</button>
                <button class="btn btn-outline" on:click=move |_| command(TvAction::Stop)>"Stop & refresh"</button>
            </div>
        </section>

        <form class="card tv-settings" on:submit=on_save>
            <h2>"Display settings"</h2>
            <label>
                "Seconds per slide"
                <input
                    type="number"
                    class="form-input"
                    min="5"
                    max="300"
                    prop:value=move || interval_input.get()
                    on:input=move |ev| interval_input.set(event_target_value(&ev))
                />
            </label>
            <label>
                <input
                    type="checkbox"
                    prop:checked=move || editor.with(|p| p.settings().show_announcements)
                    on:change=move |ev| {
                        let show = event_target_checked(&ev);
                        editor.update(|p| {
                            let s = p.settings().clone();
                            p.set_display_options(show, s.show_calendar_events, s.max_announcements, s.max_events);
                        });
                    }
                />
                "Show announcements"
            </label>
            <label>
                <input
                    type="checkbox"
                    prop:checked=move || editor.with(|p| p.settings().show_calendar_events)
                    on:change=move |ev| {
                        let show = event_target_checked(&ev);
                        editor.update(|p| {
                            let s = p.settings().clone();
                            p.set_display_options(s.show_announcements, show, s.max_announcements, s.max_events);
                        });
                    }
                />
                "Show calendar events"
            </label>
            <label>
                "Max announcements"
                <input
                    type="number"
                    class="form-input"
                    min="0"
                    prop:value=move || editor.with(|p| p.settings().max_announcements.to_string())
                    on:input=move |ev| {
                        if let Ok(max) = event_target_value(&ev).parse::<usize>() {
                            editor.update(|p| {
                                let s = p.settings().clone();
                                p.set_display_options(s.show_announcements, s.show_calendar_events, max, s.max_events);
                            });
                        }
                    }
                />
            </label>
            <label>
                "Max events"
                <input
                    type="number"
                    class="form-input"
                    min="0"
                    prop:value=move || editor.with(|p| p.settings().max_events.to_string())
                    on:input=move |ev| {
                        if let Ok(max) = event_target_value(&ev).parse::<usize>() {
                            editor.update(|p| {
                                let s = p.settings().clone();
                                p.set_display_options(s.show_announcements, s.show_calendar_events, s.max_announcements, max);
                            });
                        }
                    }
                />
            </label>
            <button type="submit" class="btn btn-primary">"Save settings"</button>
        </form>

        <section class="card selection-summary">
            <h2>"Selected for display"</h2>
            <p>
                {move || {
                    let c = count();
                    format!(
                        "{} selected ({} announcements, {} events)",
                        c.total, c.announcements, c.calendar_events
                    )
                }}
            </p>
            <button class="btn btn-outline" on:click=move |_| clear_selection.clear_all()>
                "Clear selection"
            </button>
            <ol class="playlist-preview">
                {move || {
                    playlist
                        .get()
                        .into_iter()
                        .map(|slide| view! { <li>{slide.title().to_string()}</li> })
                        .collect_view()
                }}
            </ol>
        </section>

        <CandidateList heading="Announcements" rows=announcement_rows />
        <CandidateList heading="Calendar events" rows=event_rows />
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_seconds_to_ms() {
        assert_eq!(seconds_to_ms("10"), Some(10_000));
        assert_eq!(seconds_to_ms(" 7.5 "), Some(7_500));
        assert_eq!(seconds_to_ms("-1"), None);
        assert_eq!(seconds_to_ms("soon"), None);
    }

    #[wasm_bindgen_test]
    fn test_candidate_rows_describe_items() {
        let event = serde_json::from_value(serde_json::json!({
            "calendar_id": 8,
            "title": "Science fair",
            "event_date": "2024-05-02",
        }))
        .unwrap();

        let rows = candidate_rows(&[FeedContent::Event(event)], chrono_tz::UTC);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 8);
        assert_eq!(rows[0].kind, ContentKind::CalendarEvent);
        assert_eq!(rows[0].detail, "May 02, 2024");
    }

    #[wasm_bindgen_test]
    fn test_emergency_publish_leaves_unsaved_options_behind() {
        let saved = TvSettings::default();
        let mut editor = TvPlayback::new(saved.clone());
        editor.set_display_options(false, true, 3, 1);

        let pending = TvPlayback::request_emergency("  Shelter in place  ").unwrap();
        let published = with_emergency(&saved, Some(pending));

        assert!(!editor.settings().show_announcements);
        assert!(published.emergency_active);
        assert_eq!(published.emergency_message, "Shelter in place");
        assert!(published.show_announcements);
        assert_eq!(published.max_announcements, saved.max_announcements);
        assert_eq!(published.max_events, saved.max_events);

        let cleared = with_emergency(&published, None);
        assert!(!cleared.emergency_active);
        assert!(cleared.emergency_message.is_empty());
        assert_eq!(
            TvSettings {
                emergency_active: false,
                emergency_message: String::new(),
                ..published
            },
            cleared
        );
    }
}

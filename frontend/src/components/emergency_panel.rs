use leptos::*;
use shared::tv::{EmergencyError, PendingBroadcast, TvPlayback};

fn validation_message(message: &str) -> Option<String> {
    match TvPlayback::request_emergency(message) {
        Ok(_) => None,
        // An empty box needs no warning, the disabled button says enough
        Err(EmergencyError::Empty) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Two-step emergency broadcast: validate and stage, then confirm.
#[component]
pub fn EmergencyPanel(
    #[prop(into)] active_message: Signal<Option<String>>,
    #[prop(into)] busy: Signal<bool>,
    #[prop(into)] on_confirm: Callback<PendingBroadcast>,
    #[prop(into)] on_clear: Callback<()>,
) -> impl IntoView {
    let draft = create_rw_signal(String::new());
    let staged = create_rw_signal(None::<PendingBroadcast>);

    let validation = move || draft.with(|d| TvPlayback::request_emergency(d));
    let char_count = move || draft.with(|d| d.chars().count());

    let stage = move |_| {
        if let Ok(pending) = validation() {
            staged.set(Some(pending));
        }
    };

    let confirm = move |_| {
        if let Some(pending) = staged.get_untracked() {
            staged.set(None);
            draft.set(String::new());
            on_confirm.call(pending);
        }
    };

    view! {
        <section class="card emergency-panel">
            <h2>"Emergency broadcast"</h2>
            {move || {
                active_message
                    .get()
                    .map(|message| {
                        view! {
                            <div class="alert alert-error">
                                <strong>"On air: "</strong>
                                {message}
                                <button
                                    class="btn btn-outline btn-sm"
                                    disabled=move || busy.get()
                                    on:click=move |_| on_clear.call(())
                                >
                                    "End broadcast"
                                </button>
                            </div>
                        }
                    })
            }}
            <textarea
                class="form-input"
                rows=3
                placeholder="Message shown full-screen on every display"
                prop:value=move || draft.get()
                on:input=move |ev| {
                    draft.set(event_target_value(&ev));
                    staged.set(None);
                }
            ></textarea>
            <div class="emergency-panel-status">
                <span class="char-count">
                    {move || format!("{}/{}", char_count(), shared::tv::playback::MAX_EMERGENCY_MESSAGE_LEN)}
                </span>
                {move || {
                    draft
                        .with(|d| validation_message(d))
                        .map(|msg| view! { <span class="form-error">{msg}</span> })
                }}
            </div>
            <Show
                when=move || staged.with(|s| s.is_some())
                fallback=move || {
                    view! {
                        <button
                            class="btn btn-danger"
                            disabled=move || validation().is_err() || busy.get()
                            on:click=stage
                        >
                            "Broadcast"
                        </button>
                    }
                }
            >
                <div class="emergency-confirm">
                    <span>"Interrupt all displays with this message?"</span>
                    <button class="btn btn-danger" disabled=move || busy.get() on:click=confirm>
                        "Confirm"
                    </button>
                    <button class="btn btn-outline" on:click=move |_| staged.set(None)>
                        "Cancel"
                    </button>
                </div>
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_validation_message() {
        assert_eq!(validation_message(""), None);
        assert_eq!(validation_message("Early dismissal at noon"), None);
        assert!(validation_message(&"x".repeat(201))
            .unwrap()
            .contains("201"));
    }
}

use leptos::*;

/// Inline error for one content source with a retry action. Data already
/// loaded from the source stays on screen underneath.
#[component]
pub fn SourceError(
    #[prop(into)] source: String,
    #[prop(into)] error: Signal<Option<String>>,
    #[prop(into)] on_retry: Callback<()>,
) -> impl IntoView {
    view! {
        <Show when=move || error.with(|e| e.is_some())>
            <div class="alert alert-error" role="alert">
                <span>
                    {format!("Could not load {}: ", source)}
                    {move || error.get().unwrap_or_default()}
                </span>
                <button class="btn btn-outline btn-sm" on:click=move |_| on_retry.call(())>
                    "Retry"
                </button>
            </div>
        </Show>
    }
}

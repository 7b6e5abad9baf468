use leptos::*;

#[component]
pub fn Loading(#[prop(optional, into)] label: Option<String>) -> impl IntoView {
    view! {
        <div class="loading" role="status">
            <div class="spinner"></div>
            {label.map(|label| view! { <span class="loading-label">{label}</span> })}
        </div>
    }
}

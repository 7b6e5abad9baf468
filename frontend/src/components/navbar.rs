use leptos::*;

use crate::api::websocket::{WsClient, WsConnectionState};
use crate::api::AuthState;

#[component]
pub fn Navbar() -> impl IntoView {
    let auth_state = expect_context::<AuthState>();
    let ws_state = expect_context::<WsClient>().state();

    let live_label = move || match ws_state.get() {
        WsConnectionState::Connected => "Live",
        WsConnectionState::Connecting | WsConnectionState::Reconnecting => "Connecting…",
        WsConnectionState::Disconnected | WsConnectionState::Error => "Offline",
    };

    view! {
        <nav class="navbar">
            <div class="container navbar-content">
                <a href="/" class="navbar-brand">"School Bulletin Board"</a>
                <div class="navbar-links">
                    <a href="/">"Newsfeed"</a>
                    <Show when=move || auth_state.can_control_tv()>
                        <a href="/admin/tv">"TV control"</a>
                        <a href="/tv" target="_blank">"Open display"</a>
                    </Show>
                    <span
                        class="navbar-live"
                        class:navbar-live-on=move || ws_state.get() == WsConnectionState::Connected
                    >
                        {live_label}
                    </span>
                    <Show when=move || auth_state.is_authenticated()>
                        <button class="btn btn-outline" on:click=move |_| auth_state.logout()>
                            "Logout"
                        </button>
                    </Show>
                </div>
            </div>
        </nav>
    }
}

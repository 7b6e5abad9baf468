use leptos::*;
use leptos_router::*;
use shared::config::BoardConfig;
use shared::events::EventBus;

use crate::api::websocket::WsClient;
use crate::api::{ApiClient, AuthState};
use crate::components::navbar::Navbar;
use crate::pages::{newsfeed::NewsfeedPage, tv_control::TvControlPage, tv_display::TvDisplayPage};
use crate::state::content::provide_content_sources;
use crate::state::reactions::provide_reactions;
use crate::state::server_time::provide_server_time;
use crate::state::tv::provide_tv_selection;

#[component]
pub fn App(config: BoardConfig) -> impl IntoView {
    provide_context(config.clone());

    let auth_state = AuthState::new();
    provide_context(auth_state);

    let api = ApiClient::new(&config);
    provide_context(api.clone());

    let bus = EventBus::new();
    provide_context(bus.clone());

    let ws = WsClient::new(bus.clone(), &config.ws_path);
    ws.connect();
    provide_context(ws.clone());
    on_cleanup(move || ws.disconnect());

    provide_server_time(api.clone(), &config);
    let sources = provide_content_sources(api.clone(), &bus, &config);
    provide_reactions(api, &bus, &sources, auth_state);
    provide_tv_selection();

    view! {
        <Router>
            <main>
                <Routes>
                    <Route path="/tv" view=TvDisplayPage />
                    <Route path="/" view=BoardLayout>
                        <Route path="" view=NewsfeedPage />
                        <Route path="/admin/tv" view=TvControlPage />
                    </Route>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn BoardLayout() -> impl IntoView {
    view! {
        <Navbar />
        <div class="container">
            <Outlet />
        </div>
    }
}

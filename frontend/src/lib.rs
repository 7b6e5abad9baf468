pub mod api;
pub mod app;
pub mod components;
pub mod config;
pub mod logging;
pub mod pages;
pub mod state;
pub mod storage;
pub mod utils;

use leptos::*;
use log::LevelFilter;
use wasm_bindgen::prelude::*;

use crate::app::App;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Installed before the config is read so a bad override gets reported
    logging::init(LevelFilter::Info);
    let config = config::load();
    logging::init(config.log_level());
    log::info!(
        "Bulletin board starting (api {}, tz {})",
        config.api_base,
        config.timezone
    );

    mount_to_body(move || view! { <App config=config.clone() /> });
}

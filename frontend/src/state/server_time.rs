use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use gloo_timers::callback::Interval;
use leptos::*;
use shared::clock::ServerClock;
use shared::config::BoardConfig;

use crate::api::ApiClient;

/// How often time-dependent views re-evaluate between server syncs.
const HEARTBEAT_MS: u32 = 60_000;

/// Server-authoritative clock. Falls back to the device clock until the
/// first successful sync, so `now` always has a value.
#[derive(Clone, Copy)]
pub struct ServerTime {
    clock: RwSignal<ServerClock>,
    heartbeat: RwSignal<u64>,
    tz: Tz,
}

impl ServerTime {
    /// Current server time. Reactive: subscribers re-run on every sync and
    /// once per heartbeat.
    pub fn now(&self) -> DateTime<Utc> {
        self.heartbeat.track();
        self.clock.with(|clock| clock.now())
    }

    pub fn now_untracked(&self) -> DateTime<Utc> {
        self.clock.with_untracked(|clock| clock.now())
    }

    pub fn today(&self) -> NaiveDate {
        self.heartbeat.track();
        self.clock.with(|clock| clock.today(self.tz))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn is_synced(&self) -> bool {
        self.clock.with(|clock| clock.is_synced())
    }
}

async fn sync(api: ApiClient, clock: RwSignal<ServerClock>) {
    match api.server_time().await {
        Ok(response) => {
            let received_at = Utc::now();
            clock.update(|clock| {
                if let Err(e) = clock.sync(&response.timestamp, received_at) {
                    log::warn!("Ignoring server time: {}", e);
                }
            });
        }
        Err(e) => log::warn!("Server time unavailable, using device clock: {}", e),
    }
}

/// Create the clock, sync it once and then every
/// `server_time_refresh_secs`. Both timers stop when the owner is disposed.
pub fn provide_server_time(api: ApiClient, config: &BoardConfig) -> ServerTime {
    let time = ServerTime {
        clock: create_rw_signal(ServerClock::new()),
        heartbeat: create_rw_signal(0),
        tz: config.tz(),
    };

    let clock = time.clock;
    wasm_bindgen_futures::spawn_local(sync(api.clone(), clock));

    let refresh_ms = config
        .server_time_refresh_secs
        .saturating_mul(1000)
        .clamp(1000, u64::from(u32::MAX)) as u32;
    let refresh = Interval::new(refresh_ms, move || {
        wasm_bindgen_futures::spawn_local(sync(api.clone(), clock));
    });

    let heartbeat = time.heartbeat;
    let tick = Interval::new(HEARTBEAT_MS, move || heartbeat.update(|n| *n += 1));

    on_cleanup(move || {
        drop(refresh);
        drop(tick);
    });

    provide_context(time);
    time
}

pub fn use_server_time() -> ServerTime {
    expect_context::<ServerTime>()
}

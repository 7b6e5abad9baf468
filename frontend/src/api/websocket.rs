use gloo_storage::{LocalStorage, Storage};
use gloo_timers::callback::Timeout;
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use shared::events::EventBus;
use shared::{BoardEvent, WsClientMessage};

use super::TOKEN_KEY;

const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl WsConnectionState {
    fn is_active(self) -> bool {
        matches!(
            self,
            WsConnectionState::Connecting
                | WsConnectionState::Connected
                | WsConnectionState::Reconnecting
        )
    }
}

/// Push-channel transport. Every decoded server event is published on the
/// [`EventBus`]; nothing else in the app talks to the socket.
#[derive(Clone)]
pub struct WsClient {
    ws: Rc<RefCell<Option<WebSocket>>>,
    bus: EventBus,
    path: String,
    state: RwSignal<WsConnectionState>,
    reconnect_attempts: Rc<RefCell<u32>>,
    reconnect_timeout: Rc<RefCell<Option<Timeout>>>,
}

impl WsClient {
    pub fn new(bus: EventBus, path: &str) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            bus,
            path: path.to_string(),
            state: create_rw_signal(WsConnectionState::Disconnected),
            reconnect_attempts: Rc::new(RefCell::new(0)),
            reconnect_timeout: Rc::new(RefCell::new(None)),
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ReadSignal<WsConnectionState> {
        self.state.read_only()
    }

    /// Connect to the push channel. No-op while a connection is open or pending.
    pub fn connect(&self) {
        if self.state.get_untracked().is_active() && self.ws.borrow().is_some() {
            return;
        }

        let Some(window) = web_sys::window() else {
            self.state.set(WsConnectionState::Error);
            return;
        };
        let location = window.location();
        let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
        let host = location.host().unwrap_or_else(|_| "localhost".to_string());
        let url = socket_url(&protocol, &host, &self.path);

        self.state.set(WsConnectionState::Connecting);
        let ws = match WebSocket::new(&url) {
            Ok(ws) => ws,
            Err(e) => {
                log::warn!("Could not open push channel at {}: {:?}", url, e);
                self.state.set(WsConnectionState::Error);
                return;
            }
        };

        ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

        // onopen handler
        let state = self.state;
        let reconnect_attempts = self.reconnect_attempts.clone();
        let ws_clone = ws.clone();
        let onopen = Closure::wrap(Box::new(move |_| {
            state.set(WsConnectionState::Connected);
            *reconnect_attempts.borrow_mut() = 0;
            log::info!("Push channel connected");

            if let Ok(token) = LocalStorage::get::<String>(TOKEN_KEY) {
                let msg = WsClientMessage::Authenticate { token };
                if let Ok(json) = serde_json::to_string(&msg) {
                    let _ = ws_clone.send_with_str(&json);
                }
            }
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();

        // onmessage handler
        let bus = self.bus.clone();
        let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Some(text) = e.data().as_string() {
                match decode_event(&text) {
                    Some(event) => {
                        bus.publish(&event);
                    }
                    None => log::debug!("Ignoring unrecognised push message"),
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        // onerror handler
        let state = self.state;
        let onerror = Closure::wrap(Box::new(move |_: ErrorEvent| {
            state.set(WsConnectionState::Error);
        }) as Box<dyn FnMut(ErrorEvent)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        // onclose handler
        let client = self.clone();
        let onclose = Closure::wrap(Box::new(move |_: CloseEvent| {
            client.state.set(WsConnectionState::Disconnected);
            *client.ws.borrow_mut() = None;
            client.schedule_reconnect();
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        *self.ws.borrow_mut() = Some(ws);
    }

    fn schedule_reconnect(&self) {
        let attempts = *self.reconnect_attempts.borrow();
        let Some(delay_ms) = reconnect_delay_ms(attempts) else {
            log::warn!("Push channel gave up after {} attempts", attempts);
            self.state.set(WsConnectionState::Error);
            return;
        };

        self.state.set(WsConnectionState::Reconnecting);
        *self.reconnect_attempts.borrow_mut() = attempts + 1;

        let client = self.clone();
        let timeout = Timeout::new(delay_ms, move || {
            client.connect();
        });
        *self.reconnect_timeout.borrow_mut() = Some(timeout);
    }

    /// Close the socket and stop reconnecting.
    pub fn disconnect(&self) {
        *self.reconnect_timeout.borrow_mut() = None;
        *self.reconnect_attempts.borrow_mut() = MAX_RECONNECT_ATTEMPTS;

        if let Some(ws) = self.ws.borrow_mut().take() {
            ws.set_onclose(None);
            let _ = ws.close();
        }
        self.state.set(WsConnectionState::Disconnected);
    }
}

/// Exponential backoff: 1s, 2s, 4s, 8s, 16s, then give up.
fn reconnect_delay_ms(attempts: u32) -> Option<u32> {
    (attempts < MAX_RECONNECT_ATTEMPTS).then(|| 1000 * (1 << attempts))
}

fn socket_url(page_protocol: &str, host: &str, path: &str) -> String {
    if path.starts_with("ws://") || path.starts_with("wss://") {
        return path.to_string();
    }
    let ws_protocol = if page_protocol == "https:" { "wss:" } else { "ws:" };
    format!("{}//{}/{}", ws_protocol, host, path.trim_start_matches('/'))
}

fn decode_event(text: &str) -> Option<BoardEvent> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_backoff_schedule() {
        let delays: Vec<Option<u32>> = (0..6).map(reconnect_delay_ms).collect();
        assert_eq!(
            delays,
            vec![Some(1000), Some(2000), Some(4000), Some(8000), Some(16000), None]
        );
    }

    #[wasm_bindgen_test]
    fn test_socket_url_follows_page_protocol() {
        assert_eq!(socket_url("https:", "school.example", "/api/ws"), "wss://school.example/api/ws");
        assert_eq!(socket_url("http:", "localhost:8080", "api/ws"), "ws://localhost:8080/api/ws");
        assert_eq!(socket_url("https:", "ignored", "wss://push.example/ws"), "wss://push.example/ws");
    }

    #[wasm_bindgen_test]
    fn test_decode_event() {
        assert_eq!(
            decode_event(r#"{"type":"announcement_deleted","id":3}"#),
            Some(BoardEvent::AnnouncementDeleted { id: 3 })
        );
        assert_eq!(decode_event(r#"{"type":"chat_message"}"#), None);
    }
}

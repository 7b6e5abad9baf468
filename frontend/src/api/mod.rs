pub mod websocket;

use gloo_net::http::{Request, RequestBuilder};
use gloo_storage::{LocalStorage, Storage};
use leptos::*;
use serde::{de::DeserializeOwned, Serialize};
use shared::config::BoardConfig;
use shared::content::ListQuery;
use shared::{
    Announcement, ApiError, ApiSuccess, CalendarEvent, ContentKey, ContentKind,
    EmergencyBroadcastRequest, ListResponse, ReactionResponse, ServerTimeResponse, Viewer,
};
use thiserror::Error;

pub const TOKEN_KEY: &str = "auth_token";
pub const VIEWER_KEY: &str = "auth_viewer";

/// The signed-in user as far as this client knows. Sign-in itself happens
/// elsewhere; the token and viewer are read from local storage.
#[derive(Clone, Copy)]
pub struct AuthState {
    pub token: RwSignal<Option<String>>,
    pub viewer: RwSignal<Option<Viewer>>,
}

impl AuthState {
    pub fn new() -> Self {
        let stored_token: Option<String> = LocalStorage::get(TOKEN_KEY).ok();
        let stored_viewer: Option<Viewer> = LocalStorage::get(VIEWER_KEY).ok();

        Self {
            token: create_rw_signal(stored_token),
            viewer: create_rw_signal(stored_viewer),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.get().is_some()
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer.get()
    }

    pub fn can_control_tv(&self) -> bool {
        self.viewer.get().is_some_and(|v| v.role.can_control_tv())
    }

    pub fn logout(&self) {
        LocalStorage::delete(TOKEN_KEY);
        LocalStorage::delete(VIEWER_KEY);
        self.token.set(None);
        self.viewer.set(None);
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] gloo_net::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Delete,
}

/// HTTP client for the board API.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn get_token() -> Option<String> {
        LocalStorage::get(TOKEN_KEY).ok()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        let request = match method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Delete => Request::delete(&url),
        };
        match Self::get_token() {
            Some(token) => request.header("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        body: Option<impl Serialize>,
    ) -> Result<T, ClientError> {
        let response = match body {
            Some(body) => {
                request
                    .header("Content-Type", "application/json")
                    .json(&body)?
                    .send()
                    .await?
            }
            None => request.send().await?,
        };

        if response.ok() {
            let result: ApiSuccess<T> = response.json().await?;
            Ok(result.data)
        } else {
            let status = response.status();
            let error: ApiError = response.json().await.unwrap_or(ApiError {
                error: "unknown".to_string(),
                message: format!("Request failed with status {}", status),
            });
            Err(ClientError::Api {
                status,
                message: error.message,
            })
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
        fresh: bool,
    ) -> Result<ListResponse<T>, String> {
        let cache_bust = fresh.then(|| chrono::Utc::now().timestamp_millis());
        let mut request = self.builder(Method::Get, path).query(query.params(cache_bust));
        if fresh {
            request = request.header("Cache-Control", "no-cache");
        }
        Self::send(request, None::<()>)
            .await
            .map_err(|e| e.to_string())
    }

    // Content endpoints
    pub async fn list_announcements(
        &self,
        query: &ListQuery,
        fresh: bool,
    ) -> Result<ListResponse<Announcement>, String> {
        self.list("/announcements", query, fresh).await
    }

    pub async fn list_calendar_events(
        &self,
        query: &ListQuery,
        fresh: bool,
    ) -> Result<ListResponse<CalendarEvent>, String> {
        // The calendar endpoint has no grade filter
        let query = ListQuery {
            grade_level: None,
            ..query.clone()
        };
        self.list("/calendar", &query, fresh).await
    }

    // Reaction endpoints
    pub async fn toggle_like(&self, key: ContentKey) -> Result<ReactionResponse, String> {
        let path = like_path(key);
        let response: ReactionResponse = Self::send(self.builder(Method::Post, &path), None::<()>)
            .await
            .map_err(|e| e.to_string())?;
        if response.success {
            Ok(response)
        } else {
            Err(format!("Server rejected reaction on {}", key))
        }
    }

    // Time endpoint
    pub async fn server_time(&self) -> Result<ServerTimeResponse, String> {
        Self::send(self.builder(Method::Get, "/time"), None::<()>)
            .await
            .map_err(|e| e.to_string())
    }

    // TV endpoints
    pub async fn broadcast_emergency(&self, message: &str) -> Result<(), String> {
        let body = EmergencyBroadcastRequest {
            message: message.to_string(),
        };
        Self::send::<serde_json::Value>(self.builder(Method::Post, "/tv/emergency"), Some(body))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    pub async fn clear_emergency(&self) -> Result<(), String> {
        Self::send::<serde_json::Value>(self.builder(Method::Delete, "/tv/emergency"), None::<()>)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

fn like_path(key: ContentKey) -> String {
    match key.kind {
        ContentKind::Announcement => format!("/announcements/{}/like", key.id),
        ContentKind::CalendarEvent => format!("/calendar/{}/like", key.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_like_paths() {
        assert_eq!(like_path(ContentKey::announcement(4)), "/announcements/4/like");
        assert_eq!(like_path(ContentKey::calendar_event(9)), "/calendar/9/like");
    }

    #[wasm_bindgen_test]
    fn test_url_uses_configured_base() {
        let config = BoardConfig {
            api_base: "https://board.example/api/".to_string(),
            ..BoardConfig::default()
        };
        let client = ApiClient::new(&config);
        assert_eq!(client.url("/time"), "https://board.example/api/time");
    }

    #[wasm_bindgen_test]
    fn test_client_error_message_is_server_message() {
        let err = ClientError::Api {
            status: 403,
            message: "Admins only".to_string(),
        };
        assert_eq!(err.to_string(), "Admins only");
    }
}

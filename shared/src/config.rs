use chrono_tz::Tz;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::dates;

/// Client configuration. Every field has a default so a partial JSON
/// override only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub api_base: String,
    pub ws_path: String,
    pub asset_base: String,
    pub timezone: String,
    pub feed_page_size: usize,
    pub fetch_page_size: u32,
    pub server_time_refresh_secs: u64,
    pub kiosk_poll_ms: u32,
    pub log_level: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".to_string(),
            ws_path: "/api/ws".to_string(),
            asset_base: "/uploads".to_string(),
            timezone: "UTC".to_string(),
            feed_page_size: 10,
            fetch_page_size: 500,
            server_time_refresh_secs: 300,
            kiosk_poll_ms: 2_000,
            log_level: "info".to_string(),
        }
    }
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn tz(&self) -> Tz {
        dates::parse_timezone(&self.timezone)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Resolve a relative image path against the asset base.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.asset_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BoardConfig::default();

        assert_eq!(config.api_base, "/api");
        assert_eq!(config.ws_path, "/api/ws");
        assert_eq!(config.server_time_refresh_secs, 300);
        assert_eq!(config.fetch_page_size, 500);
        assert_eq!(config.tz(), chrono_tz::UTC);
        assert_eq!(config.log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_config_partial_override() {
        let config =
            BoardConfig::from_json(r#"{"timezone": "Asia/Manila", "log_level": "debug"}"#).unwrap();

        assert_eq!(config.tz(), chrono_tz::Asia::Manila);
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.api_base, "/api");
        assert_eq!(config.feed_page_size, 10);
    }

    #[test]
    fn test_config_bad_values_fall_back() {
        let config =
            BoardConfig::from_json(r#"{"timezone": "Mars/Olympus", "log_level": "loud"}"#).unwrap();

        assert_eq!(config.tz(), chrono_tz::UTC);
        assert_eq!(config.log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_asset_url() {
        let config = BoardConfig::default();

        assert_eq!(config.asset_url("images/a.png"), "/uploads/images/a.png");
        assert_eq!(config.asset_url("/images/a.png"), "/uploads/images/a.png");
        assert_eq!(
            config.asset_url("https://cdn.example.org/a.png"),
            "https://cdn.example.org/a.png"
        );
    }
}

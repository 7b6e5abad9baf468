//! Server-authoritative clock.
//!
//! Visibility rules must not depend on the device clock, which users can
//! change. The clock keeps the offset observed at the last successful sync
//! and applies it to the local clock, so `now()` keeps moving between syncs
//! and is usable before the first sync has completed.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::dates;

#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("Unparseable server timestamp: {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Clone, Default)]
pub struct ServerClock {
    offset: Option<Duration>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current authoritative time. Falls back to the device clock until a
    /// sync has succeeded.
    pub fn now(&self) -> DateTime<Utc> {
        self.now_at(Utc::now())
    }

    /// Authoritative time corresponding to the given device instant.
    pub fn now_at(&self, local: DateTime<Utc>) -> DateTime<Utc> {
        match self.offset {
            Some(offset) => local + offset,
            None => local,
        }
    }

    /// Today's calendar date in `tz`.
    pub fn today(&self, tz: Tz) -> NaiveDate {
        dates::today_in_tz(self.now(), tz)
    }

    /// Record a server timestamp received at device time `received_at`.
    ///
    /// A failed sync keeps the previous offset.
    pub fn sync(&mut self, server_timestamp: &str, received_at: DateTime<Utc>) -> Result<(), ClockError> {
        let server_now = dates::parse_timestamp(server_timestamp, chrono_tz::UTC)
            .ok_or_else(|| ClockError::InvalidTimestamp(server_timestamp.to_string()))?;

        let offset = server_now - received_at;
        log::debug!("Server clock synced, offset {} ms", offset.num_milliseconds());
        self.offset = Some(offset);
        Ok(())
    }

    pub fn is_synced(&self) -> bool {
        self.offset.is_some()
    }
}

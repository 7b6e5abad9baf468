//! Platform-independent core of the bulletin board client.
//!
//! Everything in here is plain Rust so it can be unit-tested natively; the
//! `frontend` crate binds it to the browser.

pub mod clock;
pub mod config;
pub mod content;
pub mod dates;
pub mod events;
pub mod feed;
pub mod reactions;
pub mod storage;
pub mod tv;
pub mod types;

pub use types::*;

//! Application-wide reactive state, provided as Leptos contexts.

pub mod content;
pub mod reactions;
pub mod server_time;
pub mod tv;

pub mod format;

pub use format::{format_date, format_datetime, format_event_dates};

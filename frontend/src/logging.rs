//! `log` backend writing to the browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format_record(record.level(), record.target(), &record.args().to_string()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

fn format_record(level: Level, target: &str, message: &str) -> String {
    format!("[{}] {}: {}", level, target, message)
}

/// Install the console logger. Safe to call more than once; later calls only
/// adjust the level.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("Console logger already installed");
    }
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_format_record_includes_level_and_target() {
        let line = format_record(Level::Warn, "frontend::state", "fetch failed");
        assert_eq!(line, "[WARN] frontend::state: fetch failed");
    }

    #[wasm_bindgen_test]
    fn test_init_twice_keeps_latest_level() {
        init(LevelFilter::Info);
        init(LevelFilter::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}

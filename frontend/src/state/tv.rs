//! TV selection, settings and playback bound to the browser.
//!
//! The control panel and the kiosk usually run in different tabs or on
//! different screens of the same machine. They share selection, settings and
//! the latest playback command through local storage; the kiosk polls it.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use leptos::*;
use shared::feed::TvCandidates;
use shared::storage::{load_json, save_json, TV_COMMAND_KEY, TV_SETTINGS_KEY};
use shared::tv::{
    RefreshRequested, SelectionCount, SettingsError, TvAction, TvCommand, TvPlayback, TvSelection,
    TvSelectionStore, TvSettings,
};
use shared::ContentKind;

use crate::storage::BrowserStorage;

/// Persisted TV selection with a reactive mirror for the views.
#[derive(Clone)]
pub struct TvSelectionContext {
    store: Rc<RefCell<TvSelectionStore<BrowserStorage>>>,
    selection: RwSignal<TvSelection>,
}

impl TvSelectionContext {
    pub fn new() -> Self {
        let store = TvSelectionStore::new(BrowserStorage);
        let selection = create_rw_signal(store.selection().clone());
        Self {
            store: Rc::new(RefCell::new(store)),
            selection,
        }
    }

    pub fn selection(&self) -> TvSelection {
        self.selection.get()
    }

    pub fn is_selected(&self, id: i64, kind: ContentKind) -> bool {
        self.selection.with(|s| s.contains(id, kind))
    }

    pub fn count(&self) -> SelectionCount {
        self.selection.with(|s| s.count())
    }

    // The store borrow is released before the signal fires, so effects may
    // read the context again.
    fn mutate<R>(&self, f: impl FnOnce(&mut TvSelectionStore<BrowserStorage>) -> R) -> R {
        let (result, changed, next) = {
            let mut store = self.store.borrow_mut();
            let before = store.selection().clone();
            let result = f(&mut store);
            let next = store.selection().clone();
            (result, next != before, next)
        };
        if changed {
            self.selection.set(next);
        }
        result
    }

    pub fn toggle(&self, id: i64, kind: ContentKind) -> bool {
        self.mutate(|store| store.toggle(id, kind))
    }

    pub fn clear_all(&self) {
        self.mutate(|store| store.clear_all());
    }

    /// Forget selections that are no longer eligible for display.
    pub fn retain(&self, candidates: &TvCandidates) {
        let announcement_ids = candidates.announcement_ids();
        let event_ids = candidates.event_ids();
        self.mutate(|store| store.retain(&announcement_ids, &event_ids));
    }

    /// Pick up changes written by another tab.
    pub fn reload(&self) -> bool {
        self.mutate(|store| store.reload())
    }
}

impl Default for TvSelectionContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn provide_tv_selection() -> TvSelectionContext {
    let selection = TvSelectionContext::new();
    provide_context(selection.clone());
    selection
}

pub fn use_tv_selection() -> TvSelectionContext {
    expect_context::<TvSelectionContext>()
}

pub fn load_settings() -> TvSettings {
    let settings: TvSettings = load_json(&BrowserStorage, TV_SETTINGS_KEY).unwrap_or_default();
    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            log::warn!("Stored TV settings rejected ({}), using defaults", e);
            TvSettings::default()
        }
    }
}

pub fn save_settings(settings: &TvSettings) -> Result<(), String> {
    settings.validate().map_err(|e| e.to_string())?;
    save_json(&BrowserStorage, TV_SETTINGS_KEY, settings).map_err(|e| e.to_string())
}

pub fn load_command() -> Option<TvCommand> {
    load_json(&BrowserStorage, TV_COMMAND_KEY)
}

/// Hand a playback command to the kiosk.
pub fn send_command(action: TvAction) -> Result<TvCommand, String> {
    let command = TvCommand::after(load_command().as_ref(), action);
    save_json(&BrowserStorage, TV_COMMAND_KEY, &command).map_err(|e| e.to_string())?;
    log::info!("TV command {:?} (#{})", action, command.seq);
    Ok(command)
}

/// Slideshow state plus the autoplay timer that drives it.
#[derive(Clone)]
pub struct PlaybackController {
    playback: RwSignal<TvPlayback>,
    slide_count: Signal<usize>,
    timer: Rc<RefCell<Option<Interval>>>,
}

impl PlaybackController {
    /// The timer is dropped when the current owner is disposed.
    pub fn new(settings: TvSettings, slide_count: Signal<usize>) -> Self {
        let controller = Self {
            playback: create_rw_signal(TvPlayback::new(settings)),
            slide_count,
            timer: Rc::new(RefCell::new(None)),
        };
        let timer = controller.timer.clone();
        on_cleanup(move || {
            timer.borrow_mut().take();
        });
        controller
    }

    pub fn playback(&self) -> ReadSignal<TvPlayback> {
        self.playback.read_only()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.with(|p| p.is_playing())
    }

    fn start_timer(&self) {
        let interval_ms = self
            .playback
            .with_untracked(|p| p.settings().slide_interval_ms);
        let playback = self.playback;
        let slide_count = self.slide_count;
        let timer = Interval::new(interval_ms, move || {
            let total = slide_count.get_untracked();
            playback.update(|p| {
                p.tick(total);
            });
        });
        *self.timer.borrow_mut() = Some(timer);
    }

    fn stop_timer(&self) {
        self.timer.borrow_mut().take();
    }

    pub fn play(&self) {
        let total = self.slide_count.get_untracked();
        let started = self.playback.try_update(|p| p.play(total));
        if started == Some(true) {
            self.start_timer();
        } else {
            log::debug!("Play ignored, nothing selected");
        }
    }

    pub fn pause(&self) {
        self.playback.update(|p| p.pause());
        self.stop_timer();
    }

    pub fn next(&self) {
        let total = self.slide_count.get_untracked();
        self.playback.update(|p| p.next(total));
    }

    pub fn previous(&self) {
        let total = self.slide_count.get_untracked();
        self.playback.update(|p| p.previous(total));
    }

    pub fn stop(&self) -> RefreshRequested {
        self.stop_timer();
        self.playback
            .try_update(|p| p.stop())
            .unwrap_or(RefreshRequested)
    }

    /// Apply a command from the control panel.
    pub fn apply(&self, action: TvAction) -> Option<RefreshRequested> {
        match action {
            TvAction::Play => self.play(),
            TvAction::Pause => self.pause(),
            TvAction::Next => self.next(),
            TvAction::Previous => self.previous(),
            TvAction::Stop => return Some(self.stop()),
        }
        None
    }

    /// Adopt settings saved by the control panel, restarting the timer if the
    /// slide interval changed mid-play.
    pub fn replace_settings(&self, settings: TvSettings) -> Result<(), SettingsError> {
        if self.playback.with_untracked(|p| *p.settings() == settings) {
            return Ok(());
        }
        let restart = self
            .playback
            .try_update(|p| p.replace_settings(settings))
            .transpose()?
            .unwrap_or(false);
        if restart {
            self.start_timer();
        }
        Ok(())
    }

    pub fn show_emergency(&self, message: &str) {
        match TvPlayback::request_emergency(message) {
            Ok(pending) => self.playback.update(|p| p.confirm_emergency(pending)),
            Err(e) => log::warn!("Ignoring emergency broadcast: {}", e),
        }
    }

    pub fn clear_emergency(&self) {
        self.playback.update(|p| p.clear_emergency());
    }

    pub fn set_online(&self, online: bool) {
        if self.playback.with_untracked(|p| p.is_online()) != online {
            log::info!("Display is {}", if online { "online" } else { "offline" });
            self.playback.update(|p| p.set_online(online));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_controller_play_needs_slides() {
        let runtime = create_runtime();
        let slides = create_rw_signal(0usize);
        let controller = PlaybackController::new(TvSettings::default(), slides.into());

        controller.play();
        assert!(!controller.is_playing());

        slides.set(2);
        controller.play();
        assert!(controller.is_playing());

        let _refresh = controller.stop();
        assert!(!controller.is_playing());
        runtime.dispose();
    }

    #[wasm_bindgen_test]
    fn test_controller_emergency_overrides_slides() {
        let runtime = create_runtime();
        let slides = create_rw_signal(3usize);
        let controller = PlaybackController::new(TvSettings::default(), slides.into());

        controller.show_emergency("  Shelter in place  ");
        controller
            .playback()
            .with_untracked(|p| assert_eq!(p.settings().emergency_message, "Shelter in place"));

        controller.clear_emergency();
        controller
            .playback()
            .with_untracked(|p| assert!(!p.settings().emergency_active));
        runtime.dispose();
    }

    #[wasm_bindgen_test]
    fn test_send_command_increments_sequence() {
        let first = send_command(TvAction::Play).unwrap();
        let second = send_command(TvAction::Next).unwrap();

        assert_eq!(second.seq, first.seq + 1);
        assert_eq!(load_command(), Some(second));
    }

    #[wasm_bindgen_test]
    fn test_save_settings_rejects_bad_interval() {
        let settings = TvSettings {
            slide_interval_ms: 1_000,
            ..TvSettings::default()
        };
        assert!(save_settings(&settings).is_err());
    }
}

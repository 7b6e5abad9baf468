use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::selection::TvSelection;
use crate::feed::{FeedContent, TvCandidates};

pub const MIN_SLIDE_INTERVAL_MS: u32 = 5_000;
pub const MAX_SLIDE_INTERVAL_MS: u32 = 300_000;
pub const DEFAULT_SLIDE_INTERVAL_MS: u32 = 10_000;
pub const MAX_EMERGENCY_MESSAGE_LEN: usize = 200;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Slide interval {value} ms is outside {min}..={max} ms")]
    SlideIntervalOutOfRange { value: u32, min: u32, max: u32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum EmergencyError {
    #[error("Emergency message is empty")]
    Empty,
    #[error("Emergency message is {length} characters, the limit is {max}")]
    TooLong { length: usize, max: usize },
}

/// Kiosk settings shared between the control panel and the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvSettings {
    pub slide_interval_ms: u32,
    pub show_announcements: bool,
    pub show_calendar_events: bool,
    pub emergency_active: bool,
    pub emergency_message: String,
    pub max_announcements: usize,
    pub max_events: usize,
}

impl Default for TvSettings {
    fn default() -> Self {
        Self {
            slide_interval_ms: DEFAULT_SLIDE_INTERVAL_MS,
            show_announcements: true,
            show_calendar_events: true,
            emergency_active: false,
            emergency_message: String::new(),
            max_announcements: 10,
            max_events: 10,
        }
    }
}

impl TvSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_slide_interval(self.slide_interval_ms)
    }
}

fn check_slide_interval(value: u32) -> Result<(), SettingsError> {
    if (MIN_SLIDE_INTERVAL_MS..=MAX_SLIDE_INTERVAL_MS).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::SlideIntervalOutOfRange {
            value,
            min: MIN_SLIDE_INTERVAL_MS,
            max: MAX_SLIDE_INTERVAL_MS,
        })
    }
}

/// A validated emergency message waiting for the operator's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBroadcast {
    message: String,
}

impl PendingBroadcast {
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
}

/// Returned by [`TvPlayback::stop`]: the caller must re-pull content.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequested;

/// What the kiosk should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskView<'a> {
    Emergency(&'a str),
    Slide(usize),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TvAction {
    Play,
    Pause,
    Next,
    Previous,
    Stop,
}

/// Control-panel command handed to the kiosk through shared storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvCommand {
    pub seq: u64,
    pub action: TvAction,
}

impl TvCommand {
    pub fn after(previous: Option<&TvCommand>, action: TvAction) -> Self {
        Self {
            seq: previous.map_or(1, |p| p.seq + 1),
            action,
        }
    }
}

/// Tracks which commands the kiosk has already applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCursor {
    last_seq: u64,
}

impl CommandCursor {
    /// Start past whatever command is already stored, so a reload does not
    /// replay it.
    pub fn starting_at(current: Option<&TvCommand>) -> Self {
        Self {
            last_seq: current.map_or(0, |c| c.seq),
        }
    }

    pub fn accept(&mut self, command: &TvCommand) -> Option<TvAction> {
        if command.seq > self.last_seq {
            self.last_seq = command.seq;
            Some(command.action)
        } else {
            None
        }
    }
}

/// Slideshow state machine.
///
/// `total` arguments are the current selection size; the machine does not
/// own the selection.
#[derive(Debug, Clone)]
pub struct TvPlayback {
    state: PlaybackState,
    current_index: usize,
    is_online: bool,
    settings: TvSettings,
}

impl Default for TvPlayback {
    fn default() -> Self {
        Self::new(TvSettings::default())
    }
}

impl TvPlayback {
    pub fn new(settings: TvSettings) -> Self {
        Self {
            state: PlaybackState::Paused,
            current_index: 0,
            is_online: true,
            settings,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
    }

    pub fn settings(&self) -> &TvSettings {
        &self.settings
    }

    /// Start the slideshow. Nothing happens without a selection.
    pub fn play(&mut self, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        self.state = PlaybackState::Playing;
        true
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    pub fn next(&mut self, total: usize) {
        if total == 0 {
            return;
        }
        self.current_index = (self.current_index + 1) % total;
    }

    pub fn previous(&mut self, total: usize) {
        if total == 0 {
            return;
        }
        self.current_index = (self.current_index % total + total - 1) % total;
    }

    /// Pause and rewind to the first slide.
    pub fn stop(&mut self) -> RefreshRequested {
        self.pause();
        self.current_index = 0;
        RefreshRequested
    }

    /// Autoplay step. Returns whether the slide moved.
    pub fn tick(&mut self, total: usize) -> bool {
        if !self.is_playing() || total == 0 {
            return false;
        }
        self.next(total);
        true
    }

    pub fn apply(&mut self, action: TvAction, total: usize) -> Option<RefreshRequested> {
        match action {
            TvAction::Play => {
                self.play(total);
            }
            TvAction::Pause => self.pause(),
            TvAction::Next => self.next(total),
            TvAction::Previous => self.previous(total),
            TvAction::Stop => return Some(self.stop()),
        }
        None
    }

    /// Change the slide interval. `Ok(true)` means a running timer must be
    /// restarted with the new period.
    pub fn set_slide_interval(&mut self, slide_interval_ms: u32) -> Result<bool, SettingsError> {
        check_slide_interval(slide_interval_ms)?;
        let changed = self.settings.slide_interval_ms != slide_interval_ms;
        self.settings.slide_interval_ms = slide_interval_ms;
        Ok(changed && self.is_playing())
    }

    /// Replace all settings, e.g. after another context saved them. Invalid
    /// settings are rejected whole. `Ok(true)` has the same meaning as in
    /// [`TvPlayback::set_slide_interval`].
    pub fn replace_settings(&mut self, settings: TvSettings) -> Result<bool, SettingsError> {
        settings.validate()?;
        let interval_changed = self.settings.slide_interval_ms != settings.slide_interval_ms;
        self.settings = settings;
        Ok(interval_changed && self.is_playing())
    }

    pub fn set_display_options(
        &mut self,
        show_announcements: bool,
        show_calendar_events: bool,
        max_announcements: usize,
        max_events: usize,
    ) {
        self.settings.show_announcements = show_announcements;
        self.settings.show_calendar_events = show_calendar_events;
        self.settings.max_announcements = max_announcements;
        self.settings.max_events = max_events;
    }

    /// First phase of an emergency broadcast: validate the message. Nothing
    /// is changed until [`TvPlayback::confirm_emergency`].
    pub fn request_emergency(message: &str) -> Result<PendingBroadcast, EmergencyError> {
        let length = message.chars().count();
        if length > MAX_EMERGENCY_MESSAGE_LEN {
            return Err(EmergencyError::TooLong {
                length,
                max: MAX_EMERGENCY_MESSAGE_LEN,
            });
        }
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(EmergencyError::Empty);
        }
        Ok(PendingBroadcast {
            message: trimmed.to_string(),
        })
    }

    pub fn confirm_emergency(&mut self, pending: PendingBroadcast) {
        log::info!("Emergency broadcast active");
        self.settings.emergency_active = true;
        self.settings.emergency_message = pending.message;
    }

    pub fn clear_emergency(&mut self) {
        self.settings.emergency_active = false;
        self.settings.emergency_message.clear();
    }

    /// The emergency message wins over everything, playing or not.
    pub fn kiosk_view(&self, slide_count: usize) -> KioskView<'_> {
        if self.settings.emergency_active {
            return KioskView::Emergency(&self.settings.emergency_message);
        }
        if slide_count == 0 {
            return KioskView::Empty;
        }
        KioskView::Slide(self.current_index % slide_count)
    }
}

/// Ordered slides for the kiosk: selected, eligible announcements first,
/// then selected events, each capped by the settings.
pub fn build_playlist(
    selection: &TvSelection,
    candidates: &TvCandidates,
    settings: &TvSettings,
) -> Vec<FeedContent> {
    let mut slides = Vec::new();

    if settings.show_announcements {
        slides.extend(
            candidates
                .announcements
                .iter()
                .filter(|a| selection.announcement_ids.contains(&a.id))
                .take(settings.max_announcements)
                .cloned()
                .map(FeedContent::Announcement),
        );
    }

    if settings.show_calendar_events {
        slides.extend(
            candidates
                .events
                .iter()
                .filter(|e| selection.calendar_event_ids.contains(&e.calendar_id))
                .take(settings.max_events)
                .cloned()
                .map(FeedContent::Event),
        );
    }

    slides
}

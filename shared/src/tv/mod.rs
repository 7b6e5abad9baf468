//! TV kiosk: which content is on screen, and how the slideshow moves.

pub mod playback;
pub mod selection;

pub use playback::{
    build_playlist, CommandCursor, EmergencyError, KioskView, PendingBroadcast, PlaybackState,
    RefreshRequested, SettingsError, TvAction, TvCommand, TvPlayback, TvSettings,
};
pub use selection::{ListenerId, SelectionCount, TvSelection, TvSelectionStore};

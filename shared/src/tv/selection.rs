use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::storage::{load_json, save_json, KeyValueStore, TV_SELECTION_KEY};
use crate::ContentKind;

/// Content ids an admin has put on the TV display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvSelection {
    #[serde(default)]
    pub announcement_ids: BTreeSet<i64>,
    #[serde(default)]
    pub calendar_event_ids: BTreeSet<i64>,
}

impl TvSelection {
    fn ids(&self, kind: ContentKind) -> &BTreeSet<i64> {
        match kind {
            ContentKind::Announcement => &self.announcement_ids,
            ContentKind::CalendarEvent => &self.calendar_event_ids,
        }
    }

    fn ids_mut(&mut self, kind: ContentKind) -> &mut BTreeSet<i64> {
        match kind {
            ContentKind::Announcement => &mut self.announcement_ids,
            ContentKind::CalendarEvent => &mut self.calendar_event_ids,
        }
    }

    pub fn contains(&self, id: i64, kind: ContentKind) -> bool {
        self.ids(kind).contains(&id)
    }

    pub fn count(&self) -> SelectionCount {
        let announcements = self.announcement_ids.len();
        let calendar_events = self.calendar_event_ids.len();
        SelectionCount {
            announcements,
            calendar_events,
            total: announcements + calendar_events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.announcement_ids.is_empty() && self.calendar_event_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCount {
    pub announcements: usize,
    pub calendar_events: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&TvSelection)>;

/// Persisted TV selection.
///
/// Every mutation is written through to storage, so another browser context
/// (the kiosk) can pick it up with [`TvSelectionStore::reload`].
pub struct TvSelectionStore<S: KeyValueStore> {
    storage: S,
    selection: TvSelection,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<S: KeyValueStore> TvSelectionStore<S> {
    pub fn new(storage: S) -> Self {
        let selection = load_json(&storage, TV_SELECTION_KEY).unwrap_or_default();
        Self {
            storage,
            selection,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn selection(&self) -> &TvSelection {
        &self.selection
    }

    pub fn is_selected(&self, id: i64, kind: ContentKind) -> bool {
        self.selection.contains(id, kind)
    }

    pub fn count(&self) -> SelectionCount {
        self.selection.count()
    }

    /// Flip an item in or out of the selection. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, id: i64, kind: ContentKind) -> bool {
        let ids = self.selection.ids_mut(kind);
        let selected = if ids.remove(&id) {
            false
        } else {
            ids.insert(id);
            true
        };
        self.changed();
        selected
    }

    /// Empty both sets with a single change notification.
    pub fn clear_all(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection = TvSelection::default();
        self.changed();
    }

    /// Drop ids that are no longer eligible for display.
    pub fn retain(&mut self, announcement_ids: &HashSet<i64>, event_ids: &HashSet<i64>) {
        let before = self.selection.count().total;
        self.selection
            .announcement_ids
            .retain(|id| announcement_ids.contains(id));
        self.selection
            .calendar_event_ids
            .retain(|id| event_ids.contains(id));
        if self.selection.count().total != before {
            log::debug!(
                "Dropped {} stale TV selection(s)",
                before - self.selection.count().total
            );
            self.changed();
        }
    }

    /// Re-read storage, picking up changes made in another context. Returns
    /// whether anything changed.
    pub fn reload(&mut self) -> bool {
        let stored: TvSelection = load_json(&self.storage, TV_SELECTION_KEY).unwrap_or_default();
        if stored == self.selection {
            return false;
        }
        self.selection = stored;
        self.notify();
        true
    }

    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&TvSelection) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn changed(&mut self) {
        if let Err(e) = save_json(&self.storage, TV_SELECTION_KEY, &self.selection) {
            log::warn!("Failed to persist TV selection: {}", e);
        }
        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.selection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> TvSelectionStore<MemoryStore> {
        TvSelectionStore::new(MemoryStore::new())
    }

    #[test]
    fn test_toggle_and_count() {
        let mut store = store();

        assert!(store.toggle(1, ContentKind::Announcement));
        assert!(store.toggle(2, ContentKind::Announcement));
        assert!(store.toggle(1, ContentKind::CalendarEvent));
        assert!(!store.toggle(2, ContentKind::Announcement));

        assert!(store.is_selected(1, ContentKind::Announcement));
        assert!(!store.is_selected(2, ContentKind::Announcement));
        assert!(store.is_selected(1, ContentKind::CalendarEvent));
        assert_eq!(
            store.count(),
            SelectionCount {
                announcements: 1,
                calendar_events: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_selection_survives_reload() {
        let storage = MemoryStore::new();
        {
            let mut store = TvSelectionStore::new(storage.clone());
            store.toggle(7, ContentKind::Announcement);
            store.toggle(9, ContentKind::CalendarEvent);
        }

        let reopened = TvSelectionStore::new(storage);

        assert!(reopened.is_selected(7, ContentKind::Announcement));
        assert!(reopened.is_selected(9, ContentKind::CalendarEvent));
    }

    #[test]
    fn test_clear_all_notifies_once() {
        let mut store = store();
        store.toggle(1, ContentKind::Announcement);
        store.toggle(2, ContentKind::CalendarEvent);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_inner = seen.clone();
        store.on_change(move |selection| seen_inner.borrow_mut().push(selection.count().total));

        store.clear_all();

        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(store.count().total, 0);
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let mut store = store();
        let calls = Rc::new(RefCell::new(0));
        let calls_inner = calls.clone();
        let id = store.on_change(move |_| *calls_inner.borrow_mut() += 1);

        store.toggle(1, ContentKind::Announcement);
        store.remove_listener(id);
        store.toggle(2, ContentKind::Announcement);

        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_reload_observes_other_context() {
        let storage = MemoryStore::new();
        let mut admin = TvSelectionStore::new(storage.clone());
        let mut kiosk = TvSelectionStore::new(storage);

        admin.toggle(3, ContentKind::Announcement);

        assert!(!kiosk.is_selected(3, ContentKind::Announcement));
        assert!(kiosk.reload());
        assert!(kiosk.is_selected(3, ContentKind::Announcement));
        assert!(!kiosk.reload());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let storage = MemoryStore::new();
        storage.set(TV_SELECTION_KEY, "[1,2,").unwrap();

        let store = TvSelectionStore::new(storage);

        assert_eq!(store.count().total, 0);
    }

    #[test]
    fn test_retain_drops_ineligible_ids() {
        let mut store = store();
        store.toggle(1, ContentKind::Announcement);
        store.toggle(2, ContentKind::Announcement);
        store.toggle(5, ContentKind::CalendarEvent);

        store.retain(&HashSet::from([2]), &HashSet::new());

        assert_eq!(store.selection().announcement_ids, BTreeSet::from([2]));
        assert!(store.selection().calendar_event_ids.is_empty());
    }
}

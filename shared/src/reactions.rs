//! Optimistic like/unlike state for announcements and calendar events.

use std::collections::HashMap;

use crate::{Announcement, BoardEvent, CalendarEvent, ContentKey, Viewer};

/// A value change applied before its effect is confirmed.
///
/// Holds the value that was in place before, so a failed effect restores
/// exactly that, not whatever the slot holds by then.
#[derive(Debug, Clone)]
pub struct Speculation<T: Clone> {
    prior: T,
    applied: T,
}

impl<T: Clone> Speculation<T> {
    /// Put `next` into `slot`, remembering what was there.
    pub fn apply(slot: &mut T, next: T) -> Self {
        let prior = std::mem::replace(slot, next.clone());
        Self {
            prior,
            applied: next,
        }
    }

    pub fn commit(self) -> T {
        self.applied
    }

    pub fn rollback(self, slot: &mut T) {
        *slot = self.prior;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionState {
    pub liked: bool,
    pub count: u32,
}

impl ReactionState {
    /// State after the viewer flips their like. Counts never go below zero.
    pub fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                count: self.count.saturating_add(1),
            }
        }
    }
}

/// Content that carries the viewer's reaction.
pub trait Reactable {
    fn content_key(&self) -> ContentKey;
    fn reaction(&self) -> ReactionState;
    fn set_reaction(&mut self, state: ReactionState);
}

impl Reactable for Announcement {
    fn content_key(&self) -> ContentKey {
        self.key()
    }

    fn reaction(&self) -> ReactionState {
        ReactionState {
            liked: self.user_reaction.unwrap_or(false),
            count: self.reaction_count,
        }
    }

    fn set_reaction(&mut self, state: ReactionState) {
        self.user_reaction = Some(state.liked);
        self.reaction_count = state.count;
    }
}

impl Reactable for CalendarEvent {
    fn content_key(&self) -> ContentKey {
        self.key()
    }

    fn reaction(&self) -> ReactionState {
        ReactionState {
            liked: self.user_has_reacted,
            count: self.reaction_count,
        }
    }

    fn set_reaction(&mut self, state: ReactionState) {
        self.user_has_reacted = state.liked;
        self.reaction_count = state.count;
    }
}

/// A reaction change pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReaction {
    pub key: ContentKey,
    pub actor: Viewer,
    pub count: u32,
    pub liked: bool,
}

impl RemoteReaction {
    pub fn from_event(event: &BoardEvent) -> Option<Self> {
        match *event {
            BoardEvent::AnnouncementReactionUpdated {
                announcement_id,
                user_id,
                user_role,
                reaction_count,
                liked,
            } => Some(Self {
                key: ContentKey::announcement(announcement_id),
                actor: Viewer {
                    user_id,
                    role: user_role,
                },
                count: reaction_count,
                liked,
            }),
            BoardEvent::CalendarReactionUpdated {
                event_id,
                user_id,
                user_role,
                reaction_count,
                liked,
            } => Some(Self {
                key: ContentKey::calendar_event(event_id),
                actor: Viewer {
                    user_id,
                    role: user_role,
                },
                count: reaction_count,
                liked,
            }),
            _ => None,
        }
    }
}

/// Reaction state for every item on screen.
///
/// Toggles for the same item are serialized: while one is in flight, further
/// toggles of that item are refused.
#[derive(Debug, Default)]
pub struct ReactionStore {
    states: HashMap<ContentKey, ReactionState>,
    in_flight: HashMap<ContentKey, Speculation<ReactionState>>,
}

impl ReactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take server values for freshly fetched items. Items with a toggle in
    /// flight keep their optimistic state.
    pub fn seed<'a, T, I>(&mut self, items: I)
    where
        T: Reactable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for item in items {
            let key = item.content_key();
            if !self.in_flight.contains_key(&key) {
                self.states.insert(key, item.reaction());
            }
        }
    }

    pub fn get(&self, key: ContentKey) -> Option<ReactionState> {
        self.states.get(&key).copied()
    }

    /// Overwrite an item's reaction fields with the store's view of them.
    pub fn decorate<T: Reactable>(&self, item: &mut T) {
        if let Some(state) = self.get(item.content_key()) {
            item.set_reaction(state);
        }
    }

    pub fn is_pending(&self, key: ContentKey) -> bool {
        self.in_flight.contains_key(&key)
    }

    /// Apply the optimistic half of a toggle. Returns the new state, or
    /// `None` if a toggle for this item is still unresolved.
    pub fn begin_toggle(&mut self, key: ContentKey, currently_liked: bool) -> Option<ReactionState> {
        if self.is_pending(key) {
            log::debug!("Ignoring toggle for {} while one is in flight", key);
            return None;
        }

        let slot = self.states.entry(key).or_default();
        let next = ReactionState {
            liked: currently_liked,
            count: slot.count,
        }
        .toggled();
        let speculation = Speculation::apply(slot, next);
        self.in_flight.insert(key, speculation);
        Some(next)
    }

    /// Resolve a toggle. On failure the exact pre-toggle values come back.
    pub fn settle(&mut self, key: ContentKey, outcome: Result<(), String>) {
        let Some(speculation) = self.in_flight.remove(&key) else {
            return;
        };

        match outcome {
            Ok(()) => {
                speculation.commit();
            }
            Err(e) => {
                log::warn!("Reaction toggle for {} failed, rolling back: {}", key, e);
                let slot = self.states.entry(key).or_default();
                speculation.rollback(slot);
            }
        }
    }

    /// Reconcile a pushed reaction change. Changes made by someone else only
    /// move the count; the viewer's own changes also set their like flag.
    pub fn apply_remote(&mut self, update: &RemoteReaction, viewer: Option<&Viewer>) {
        let slot = self.states.entry(update.key).or_default();
        slot.count = update.count;
        if viewer == Some(&update.actor) {
            slot.liked = update.liked;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnnouncementStatus, UserRole};

    fn announcement(id: i64, liked: Option<bool>, count: u32) -> Announcement {
        Announcement {
            id,
            title: "Lunch menu".to_string(),
            content: String::new(),
            category_id: None,
            category_name: None,
            subcategory_name: None,
            grade_level: None,
            author_name: None,
            status: AnnouncementStatus::Published,
            is_alert: false,
            is_pinned: false,
            allow_comments: false,
            visibility_start_at: None,
            visibility_end_at: None,
            created_at: "2024-01-01".to_string(),
            deleted_at: None,
            reaction_count: count,
            user_reaction: liked,
            attachments: Vec::new(),
        }
    }

    const ME: Viewer = Viewer {
        user_id: 1,
        role: UserRole::Student,
    };

    #[test]
    fn test_speculation_rollback_restores_prior() {
        let mut slot = 5;
        let speculation = Speculation::apply(&mut slot, 6);
        assert_eq!(slot, 6);

        slot = 9;
        speculation.rollback(&mut slot);
        assert_eq!(slot, 5);
    }

    #[test]
    fn test_toggled_clamps_at_zero() {
        let state = ReactionState {
            liked: true,
            count: 0,
        };
        assert_eq!(
            state.toggled(),
            ReactionState {
                liked: false,
                count: 0
            }
        );
    }

    #[test]
    fn test_optimistic_like() {
        let mut store = ReactionStore::new();
        let item = announcement(1, Some(false), 3);
        store.seed([&item]);

        let next = store.begin_toggle(item.key(), false).unwrap();

        assert_eq!(
            next,
            ReactionState {
                liked: true,
                count: 4
            }
        );
        assert!(store.is_pending(item.key()));

        store.settle(item.key(), Ok(()));
        assert!(!store.is_pending(item.key()));
        assert_eq!(store.get(item.key()), Some(next));
    }

    #[test]
    fn test_failed_toggle_rolls_back_exactly() {
        let mut store = ReactionStore::new();
        let item = announcement(1, Some(true), 7);
        store.seed([&item]);
        let before = store.get(item.key());

        store.begin_toggle(item.key(), true);
        store.settle(item.key(), Err("Network error".to_string()));

        assert_eq!(store.get(item.key()), before);

        let mut decorated = item.clone();
        decorated.reaction_count = 0;
        store.decorate(&mut decorated);
        assert_eq!(decorated.user_reaction, Some(true));
        assert_eq!(decorated.reaction_count, 7);
    }

    #[test]
    fn test_second_toggle_refused_while_in_flight() {
        let mut store = ReactionStore::new();
        let key = ContentKey::calendar_event(4);

        assert!(store.begin_toggle(key, false).is_some());
        assert!(store.begin_toggle(key, true).is_none());

        store.settle(key, Err("timeout".to_string()));
        assert_eq!(store.get(key), Some(ReactionState::default()));
        assert!(store.begin_toggle(key, false).is_some());
    }

    #[test]
    fn test_seed_does_not_clobber_pending_toggle() {
        let mut store = ReactionStore::new();
        let item = announcement(1, Some(false), 2);
        store.seed([&item]);
        store.begin_toggle(item.key(), false);

        store.seed([&item]);

        assert_eq!(
            store.get(item.key()),
            Some(ReactionState {
                liked: true,
                count: 3
            })
        );
    }

    #[test]
    fn test_remote_reaction_from_someone_else_moves_count_only() {
        let mut store = ReactionStore::new();
        let item = announcement(1, Some(true), 2);
        store.seed([&item]);

        let update = RemoteReaction {
            key: item.key(),
            actor: Viewer {
                user_id: 2,
                role: UserRole::Student,
            },
            count: 1,
            liked: false,
        };
        store.apply_remote(&update, Some(&ME));

        assert_eq!(
            store.get(item.key()),
            Some(ReactionState {
                liked: true,
                count: 1
            })
        );
    }

    #[test]
    fn test_remote_reaction_from_viewer_reconciles_both_fields() {
        let mut store = ReactionStore::new();
        let item = announcement(1, Some(false), 2);
        store.seed([&item]);

        let update = RemoteReaction {
            key: item.key(),
            actor: ME,
            count: 3,
            liked: true,
        };
        store.apply_remote(&update, Some(&ME));
        assert_eq!(
            store.get(item.key()),
            Some(ReactionState {
                liked: true,
                count: 3
            })
        );

        // Same id, different role is a different person
        let admin_twin = RemoteReaction {
            actor: Viewer {
                user_id: 1,
                role: UserRole::Admin,
            },
            count: 2,
            liked: false,
            ..update
        };
        store.apply_remote(&admin_twin, Some(&ME));
        assert_eq!(
            store.get(item.key()),
            Some(ReactionState {
                liked: true,
                count: 2
            })
        );
    }

    #[test]
    fn test_remote_reaction_from_board_event() {
        let event = BoardEvent::CalendarReactionUpdated {
            event_id: 8,
            user_id: 3,
            user_role: UserRole::Admin,
            reaction_count: 11,
            liked: true,
        };

        let update = RemoteReaction::from_event(&event).unwrap();

        assert_eq!(update.key, ContentKey::calendar_event(8));
        assert_eq!(update.count, 11);
        assert!(RemoteReaction::from_event(&BoardEvent::EmergencyCleared).is_none());
    }
}

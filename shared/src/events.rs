//! In-process pub/sub for server push events.
//!
//! The transport (WebSocket) publishes decoded [`BoardEvent`]s here; views
//! subscribe by event kind and never see the transport.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::{BoardEvent, BoardEventKind};

type Handler = Rc<dyn Fn(&BoardEvent)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, BoardEventKind, Handler)>,
}

impl Registry {
    fn take(&mut self, id: u64) -> Vec<Handler> {
        let mut removed = Vec::new();
        self.handlers.retain(|(handler_id, _, handler)| {
            if *handler_id == id {
                removed.push(handler.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

/// Handle for a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    kind: BoardEventKind,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> BoardEventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // Handlers are dropped after the borrow ends; a handler's captures
            // may themselves hold subscriptions.
            let removed = registry.borrow_mut().take(self.id);
            drop(removed);
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: BoardEventKind, handler: F) -> Subscription
    where
        F: Fn(&BoardEvent) + 'static,
    {
        self.register(kind, Rc::new(handler))
    }

    /// Register one handler for several event kinds.
    pub fn subscribe_all<F>(&self, kinds: &[BoardEventKind], handler: F) -> Vec<Subscription>
    where
        F: Fn(&BoardEvent) + 'static,
    {
        let handler: Handler = Rc::new(handler);
        kinds
            .iter()
            .map(|kind| self.register(*kind, handler.clone()))
            .collect()
    }

    fn register(&self, kind: BoardEventKind, handler: Handler) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, kind, handler));
        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Deliver an event to every handler registered for its kind at the time
    /// of the call. Returns the number of handlers invoked.
    pub fn publish(&self, event: &BoardEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| h.clone())
            .collect();

        log::debug!("Dispatching {} to {} handler(s)", kind.as_str(), handlers.len());
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: BoardEventKind) -> usize {
        self.registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_publish_reaches_matching_handlers_only() {
        let bus = EventBus::new();
        let created = Rc::new(Cell::new(0));
        let deleted = Rc::new(Cell::new(0));

        let c = created.clone();
        let _a = bus.subscribe(BoardEventKind::AnnouncementCreated, move |_| c.set(c.get() + 1));
        let d = deleted.clone();
        let _b = bus.subscribe(BoardEventKind::AnnouncementDeleted, move |_| d.set(d.get() + 1));

        let delivered = bus.publish(&BoardEvent::AnnouncementCreated { id: 1 });

        assert_eq!(delivered, 1);
        assert_eq!(created.get(), 1);
        assert_eq!(deleted.get(), 0);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let subscription = bus.subscribe(BoardEventKind::EmergencyCleared, move |_| h.set(h.get() + 1));

        bus.publish(&BoardEvent::EmergencyCleared);
        bus.unsubscribe(subscription);
        bus.publish(&BoardEvent::EmergencyCleared);

        assert_eq!(hits.get(), 1);
        assert_eq!(bus.handler_count(BoardEventKind::EmergencyCleared), 0);
    }

    #[test]
    fn test_subscribe_all_shares_one_handler() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let subscriptions = bus.subscribe_all(&BoardEventKind::CONTENT_CHANGES, move |_| h.set(h.get() + 1));

        bus.publish(&BoardEvent::AnnouncementUpdated { id: 2 });
        bus.publish(&BoardEvent::CalendarEventChanged { id: 3 });
        drop(subscriptions);
        bus.publish(&BoardEvent::AnnouncementUpdated { id: 2 });

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = EventBus::new();
        let late_hits = Rc::new(Cell::new(0));
        let keep: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let bus_inner = bus.clone();
        let late = late_hits.clone();
        let keep_inner = keep.clone();
        let _outer = bus.subscribe(BoardEventKind::AnnouncementCreated, move |_| {
            let late = late.clone();
            let sub = bus_inner.subscribe(BoardEventKind::AnnouncementCreated, move |_| {
                late.set(late.get() + 1)
            });
            keep_inner.borrow_mut().push(sub);
        });

        // The handler added mid-dispatch does not see the current event
        bus.publish(&BoardEvent::AnnouncementCreated { id: 1 });
        assert_eq!(late_hits.get(), 0);

        bus.publish(&BoardEvent::AnnouncementCreated { id: 2 });
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let subscription = {
            let bus = EventBus::new();
            let subscription = bus.subscribe(BoardEventKind::EmergencyCleared, |_| {});
            subscription
        };
        assert_eq!(subscription.kind(), BoardEventKind::EmergencyCleared);
        drop(subscription);
    }
}

//! Unit tests for rp-bus.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{EventBus, PublishOutcome};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum Topic {
    Clock,
    Loaded,
}

/// Capture of `(handler label, payload)` pairs in delivery order.
type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

fn recorder(log: &Log, label: &'static str) -> impl FnMut(&u32) -> crate::HandlerResult + 'static {
    let log = Rc::clone(log);
    move |p: &u32| {
        log.borrow_mut().push((label, *p));
        Ok(())
    }
}

// ── Delivery ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod delivery {
    use super::*;

    #[test]
    fn handlers_run_in_registration_order() {
        let log: Log = Rc::default();
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Clock, recorder(&log, "a"));
        bus.subscribe(Topic::Clock, recorder(&log, "b"));
        bus.subscribe(Topic::Clock, recorder(&log, "c"));

        let outcome = bus.publish(&Topic::Clock, &7);
        assert_eq!(outcome, PublishOutcome { delivered: 3, failed: 0 });
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7), ("c", 7)]);
    }

    #[test]
    fn topics_are_isolated() {
        let log: Log = Rc::default();
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Clock, recorder(&log, "clock"));
        bus.subscribe(Topic::Loaded, recorder(&log, "loaded"));

        bus.publish(&Topic::Loaded, &1);
        assert_eq!(*log.borrow(), vec![("loaded", 1)]);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let mut bus: EventBus<Topic, u32> = EventBus::new();
        assert_eq!(bus.publish(&Topic::Clock, &1), PublishOutcome::default());
        assert_eq!(bus.handler_count(&Topic::Clock), 0);
    }

    #[test]
    fn handler_state_persists_between_publishes() {
        let total = Rc::new(RefCell::new(0u32));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&total);
        let mut calls = 0;
        bus.subscribe(Topic::Clock, move |p: &u32| {
            calls += 1;
            *sink.borrow_mut() += p * calls;
            Ok(())
        });
        bus.publish(&Topic::Clock, &10);
        bus.publish(&Topic::Clock, &10);
        assert_eq!(*total.borrow(), 10 + 20);
    }
}

// ── Failure isolation ─────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;

    #[test]
    fn failing_handler_does_not_block_later_handlers() {
        let log: Log = Rc::default();
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Clock, recorder(&log, "first"));
        bus.subscribe(Topic::Clock, |_: &u32| Err("display detached".into()));
        bus.subscribe(Topic::Clock, recorder(&log, "third"));

        let outcome = bus.publish(&Topic::Clock, &3);
        assert_eq!(outcome, PublishOutcome { delivered: 2, failed: 1 });
        assert_eq!(*log.borrow(), vec![("first", 3), ("third", 3)]);
    }
}

// ── Unsubscribe ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod unsubscribe {
    use super::*;

    #[test]
    fn removed_handler_is_not_called() {
        let log: Log = Rc::default();
        let mut bus = EventBus::new();
        let a = bus.subscribe(Topic::Clock, recorder(&log, "a"));
        bus.subscribe(Topic::Clock, recorder(&log, "b"));

        assert!(bus.unsubscribe(a));
        bus.publish(&Topic::Clock, &1);
        assert_eq!(*log.borrow(), vec![("b", 1)]);
        assert_eq!(bus.handler_count(&Topic::Clock), 1);
    }

    #[test]
    fn double_unsubscribe_returns_false() {
        let mut bus: EventBus<Topic, u32> = EventBus::new();
        let id = bus.subscribe(Topic::Loaded, |_| Ok(()));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
    }
}

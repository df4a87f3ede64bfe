//! The `EventBus` and its subscription bookkeeping.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::warn;

/// Error a handler may report.  Boxed so observers can use whatever error
/// type they already have.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

type Handler<P> = Box<dyn FnMut(&P) -> HandlerResult>;

/// Handle returned by [`EventBus::subscribe`]; pass it to
/// [`EventBus::unsubscribe`] to remove the handler.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

/// What happened during one [`EventBus::publish`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct PublishOutcome {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err`.
    pub failed: usize,
}

/// Synchronous publish/subscribe dispatcher keyed by topic `T`, carrying
/// payloads of type `P`.
pub struct EventBus<T, P> {
    handlers: HashMap<T, Vec<(SubscriptionId, Handler<P>)>>,
    next_id:  u64,
}

impl<T, P> Default for EventBus<T, P> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id:  0,
        }
    }
}

impl<T, P> EventBus<T, P>
where
    T: Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.  A topic may have any number of
    /// handlers; they run in the order they were registered.
    pub fn subscribe<F>(&mut self, topic: T, handler: F) -> SubscriptionId
    where
        F: FnMut(&P) -> HandlerResult + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(topic)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove a handler.  Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(sub, _)| *sub == id) {
                drop(list.remove(pos));
                return true;
            }
        }
        false
    }

    /// Invoke every handler registered for `topic`, in registration order.
    pub fn publish(&mut self, topic: &T, payload: &P) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        let Some(list) = self.handlers.get_mut(topic) else {
            return outcome;
        };

        for (id, handler) in list.iter_mut() {
            match handler(payload) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!(topic = ?topic, subscription = id.0, error = %e, "event handler failed");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }

    /// Number of handlers currently registered for `topic`.
    pub fn handler_count(&self, topic: &T) -> usize {
        self.handlers.get(topic).map_or(0, Vec::len)
    }
}

impl<T: fmt::Debug, P> fmt::Debug for EventBus<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

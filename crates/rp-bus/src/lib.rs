//! `rp-bus` — a topic-keyed publish/subscribe dispatcher.
//!
//! The bus is the only coupling between the replay core and its observers
//! (a UI showing the clock, a loading indicator, a trip-summary panel).
//! Delivery is synchronous and single-threaded.
//!
//! # Guarantees
//!
//! - Handlers for one topic run in registration order.
//! - A handler returning `Err` is logged and counted; the remaining handlers
//!   for that publish still run.
//! - Publishing to a topic with no subscribers is a no-op.
//! - Nothing is promised about ordering across topics.
//!
//! ```rust,ignore
//! let mut bus = EventBus::new();
//! let sub = bus.subscribe(Topic::Clock, |e: &ReplayEvent| {
//!     println!("{e:?}");
//!     Ok(())
//! });
//! bus.publish(&Topic::Clock, &event);
//! bus.unsubscribe(sub);
//! ```

pub mod bus;

#[cfg(test)]
mod tests;

pub use bus::{EventBus, HandlerError, HandlerResult, PublishOutcome, SubscriptionId};

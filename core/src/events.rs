//! In-process publish/subscribe event bus.
//!
//! Subscribers are invoked synchronously, in registration order, under the
//! engine's mutation lock. **Subscribers must not re-enter the engine with
//! mutating calls** — doing so would deadlock a mutex-based engine wrapper
//! or reorder pending-queue writes under an actor-based one. A subscriber
//! that needs to act on the engine should defer the work (e.g. push to its
//! own queue) rather than call back in.
//!
//! Delivery is best-effort: a panicking or slow subscriber is the
//! subscriber's problem, not contracted against here (the spec explicitly
//! allows dropped deliveries rather than stalling the emitter). This
//! implementation does not catch panics; production deployments that need
//! that isolation should run subscribers behind their own dispatch queue.

use std::collections::HashMap;

use crate::value::Details;

/// The payload carried by a published event: the event name plus a details
/// map using the same canonical `Value` encoding as audit/transaction data.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: Details,
}

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

/// Fan-out publish/subscribe bus. Not thread-safe on its own; owned by the
/// engine and protected by whatever exclusivity wraps it.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<String, Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: HashMap::new() }
    }

    /// Registers `handler` to run whenever `event_name` is published.
    pub fn subscribe<F>(&mut self, event_name: impl Into<String>, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribers
            .entry(event_name.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Publishes `event` to every subscriber registered for its name.
    /// Returns the number of subscribers invoked.
    pub fn publish(&self, event: Event) -> usize {
        let Some(handlers) = self.subscribers.get(&event.name) else {
            return 0;
        };
        for handler in handlers {
            handler(&event);
        }
        handlers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_names", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn publish_invokes_all_subscribers_of_matching_name() {
        let mut bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        let c2 = count.clone();
        bus.subscribe("gbdc:minted", move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe("gbdc:minted", move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe("gbdc:transferred", |_| panic!("should not fire"));

        let delivered = bus.publish(Event { name: "gbdc:minted".to_string(), payload: Default::default() });
        assert_eq!(delivered, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn publish_with_no_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let delivered = bus.publish(Event { name: "nothing:listens".to_string(), payload: Default::default() });
        assert_eq!(delivered, 0);
    }
}

// ── Typed topic registry ──
//
// Listener sets keyed by topic string. Publishing snapshots the handler
// list, releases the lock, then calls each handler in registration order.
// A handler that errors or panics is logged and skipped; the rest still run.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::Error;

/// Error type listeners may return. Never propagated past `publish`.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Handler<T> = Arc<dyn Fn(&T) -> Result<(), ListenerError> + Send + Sync>;

/// Opaque handle returned by [`PubSub::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// Topic-keyed listener registry.
pub struct PubSub<T> {
    next_token: AtomicU64,
    topics: Mutex<HashMap<String, Vec<(SubscriptionToken, Handler<T>)>>>,
}

impl<T> PubSub<T> {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Register `handler` for `topic`. Handlers run in registration order.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionToken
    where
        F: Fn(&T) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.into())
            .or_default()
            .push((token, Arc::new(handler)));
        token
    }

    /// Remove the handler behind `token`. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        topics.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(t, _)| *t != token);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    /// Deliver `payload` to every handler of `topic`.
    ///
    /// Returns the number of handlers that completed successfully.
    pub fn publish(&self, topic: &str, payload: &T) -> usize {
        let handlers: Vec<Handler<T>> = {
            let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
            match topics.get(topic) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for handler in handlers {
            match listener_failure(panic::catch_unwind(AssertUnwindSafe(|| handler(payload)))) {
                None => delivered += 1,
                Some(err) => warn!(topic, error = %err, "listener skipped"),
            }
        }
        delivered
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl<T> Default for PubSub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify one handler run. `None` means the handler succeeded.
fn listener_failure(outcome: std::thread::Result<Result<(), ListenerError>>) -> Option<Error> {
    match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(Error::Listener(e.to_string())),
        Err(panic) => Some(Error::Listener(format!(
            "panicked: {}",
            panic_message(&*panic)
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn publish_reaches_handlers_in_order() {
        let bus: PubSub<u32> = PubSub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            bus.subscribe("topic", move |v: &u32| {
                seen.lock().unwrap().push(format!("{tag}{v}"));
                Ok(())
            });
        }

        assert_eq!(bus.publish("topic", &7), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["a7", "b7"]);
    }

    #[test]
    fn failing_and_panicking_handlers_are_isolated() {
        let bus: PubSub<()> = PubSub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe("t", |_: &()| Err("boom".into()));
        bus.subscribe("t", |_: &()| panic!("listener exploded"));
        let counter = Arc::clone(&hits);
        bus.subscribe("t", move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(bus.publish("t", &()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_failures_become_listener_errors() {
        assert!(listener_failure(Ok(Ok(()))).is_none());

        let rejected = listener_failure(Ok(Err("bad payload".into())));
        assert!(matches!(&rejected, Some(Error::Listener(m)) if m == "bad payload"));

        let panicked = panic::catch_unwind(|| -> Result<(), ListenerError> { panic!("exploded") });
        let err = listener_failure(panicked).unwrap();
        assert_eq!(err.to_string(), "Listener failed: panicked: exploded");
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let bus: PubSub<()> = PubSub::new();
        let first = bus.subscribe("t", |_: &()| Ok(()));
        bus.subscribe("t", |_: &()| Ok(()));

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.listener_count("t"), 1);
    }

    #[test]
    fn publish_without_listeners_is_a_noop() {
        let bus: PubSub<()> = PubSub::new();
        assert_eq!(bus.publish("nobody", &()), 0);
    }
}

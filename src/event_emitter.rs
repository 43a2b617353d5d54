//! A small named-event fan-out bus, shared by [`crate::transport::Transport`]
//! (`client.<type>`/`server.<type>`/`*` wire diagnostics) and
//! [`crate::client::RealtimeClient`] (`conversation.updated` and friends).
//!
//! Mirrors the original assistant's `RealtimeEventHandler`: handlers are
//! registered by name, fired in registration order, and may be async; async
//! handlers are spawned as detached tasks so the dispatcher never blocks on
//! them (`spec.md` §4.1 "Fan-out dispatch", §5 "Async handler isolation").

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Handler<T> = Arc<dyn Fn(T) -> BoxFuture + Send + Sync>;

/// A bus of named event handlers over a single payload type `T`. Construct
/// one per component (Transport, Client) rather than sharing across
/// components with unrelated payload shapes.
pub struct EventEmitter<T> {
    handlers: Mutex<HashMap<String, Vec<Handler<T>>>>,
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> EventEmitter<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to `name`. Multiple handlers on the same name
    /// fire in registration order relative to each other, but since async
    /// handlers are detached tasks, completion order across handlers is not
    /// guaranteed — only dispatch *order* is preserved.
    pub fn on<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: Handler<T> = Arc::new(move |payload| Box::pin(handler(payload)));
        let mut handlers = self.handlers.lock().unwrap();
        handlers.entry(name.into()).or_default().push(boxed);
    }

    /// Removes every handler registered for `name`. Used by
    /// [`crate::client::RealtimeClient::reset`] to clear the Transport's
    /// wiring before re-subscribing.
    pub fn clear(&self, name: &str) {
        self.handlers.lock().unwrap().remove(name);
    }

    pub fn clear_all(&self) {
        self.handlers.lock().unwrap().clear();
    }

    /// Dispatches `payload` to every handler registered for `name`, in
    /// registration order. Each handler is spawned as an independent task
    /// and is not awaited — a panicking or long-running handler cannot stall
    /// the caller (typically the inbound pump).
    pub fn dispatch(&self, name: &str, payload: T) {
        let handlers = {
            let guard = self.handlers.lock().unwrap();
            guard.get(name).cloned().unwrap_or_default()
        };
        for handler in handlers {
            let payload = payload.clone();
            let fut = handler(payload);
            tokio::spawn(fut);
        }
    }

    /// Resolves with the payload of the next dispatch to `name`. Implemented
    /// as a one-shot subscription: a single matching dispatch fulfills the
    /// future and the handler is then inert (subsequent dispatches to the
    /// same name are ignored by this particular waiter).
    pub async fn wait_for_next(&self, name: impl Into<String>) -> T {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        self.on(name, move |payload| {
            let tx = tx.clone();
            async move {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(payload);
                }
            }
        });
        // The channel is only ever dropped after `send`, so this is infallible
        // short of the emitter itself being dropped mid-wait.
        rx.await.expect("event emitter dropped while awaiting")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn dispatches_to_all_registered_handlers() {
        let emitter: EventEmitter<i32> = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c1 = counter.clone();
        emitter.on("tick", move |n: i32| {
            let c1 = c1.clone();
            async move {
                c1.fetch_add(n as usize, Ordering::SeqCst);
            }
        });
        let c2 = counter.clone();
        emitter.on("tick", move |n: i32| {
            let c2 = c2.clone();
            async move {
                c2.fetch_add(n as usize, Ordering::SeqCst);
            }
        });

        emitter.dispatch("tick", 5);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn wait_for_next_resolves_on_matching_dispatch() {
        let emitter: Arc<EventEmitter<&'static str>> = Arc::new(EventEmitter::new());
        let emitter2 = emitter.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            emitter2.dispatch("ready", "payload");
        });
        let result = emitter.wait_for_next("ready").await;
        assert_eq!(result, "payload");
    }
}

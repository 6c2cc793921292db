//! # Listener registry.
//!
//! A [`Registry`] is the table of listener channels behind one simple
//! conductor (or one tag partition of a tagged conductor). Conductor handles
//! derived from each other share the same registry through an `Arc`.
//!
//! ## Architecture
//! ```text
//! listen()/listen_as(name) ──► write lock ──► HashMap<ListenerKey, Slot>
//!                                                       │
//! deliver(cmd) ──► read lock ──► snapshot senders ◄─────┘
//!                  (released)
//!                     └──► for each: tx.send(cmd).await ─┬─ ok     ─► log.record
//!                                                        └─ closed ─► prune
//! ```
//!
//! ## Rules
//! - `listen`/`listen_as` never block beyond the lock; they never fail.
//! - A delivery reaches the snapshot taken when it started; later listeners miss it.
//! - The lock is **not** held while waiting on a full listener.
//! - Named listeners are retained by the registry; anonymous ones are pruned
//!   once every handle to them has been dropped.

mod key;
mod listener;

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::Command;
use crate::diagnostics::DeliveryLog;

pub use key::ListenerKey;
pub use listener::Listener;

struct Slot<T> {
    tx: mpsc::Sender<T>,
    /// Kept for named listeners so that `listen_as` can hand out the same channel.
    retained: Option<Listener<T>>,
}

/// Table of active listeners.
pub(crate) struct Registry<T> {
    slots: RwLock<HashMap<ListenerKey, Slot<T>>>,
    capacity: usize,
}

impl<T> Registry<T> {
    /// Creates an empty registry whose listeners buffer `capacity` commands (min 1).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Registers a fresh listener.
    pub(crate) fn listen(&self) -> Listener<T> {
        let key = ListenerKey::fresh();
        let (tx, rx) = mpsc::channel(self.capacity);
        let listener = Listener::new(key.clone(), rx);
        self.slots.write().insert(key.clone(), Slot { tx, retained: None });
        tracing::trace!(listener = %key, "listener registered");
        listener
    }

    /// Returns the listener registered under `key`, registering it on first use.
    pub(crate) fn listen_as(&self, key: ListenerKey) -> Listener<T> {
        if let Some(existing) = self.retained(&key) {
            return existing;
        }

        let mut slots = self.slots.write();
        if let Some(existing) = slots.get(&key).and_then(|s| s.retained.clone()) {
            return existing;
        }
        let (tx, rx) = mpsc::channel(self.capacity);
        let listener = Listener::new(key.clone(), rx);
        slots.insert(
            key.clone(),
            Slot {
                tx,
                retained: Some(listener.clone()),
            },
        );
        tracing::trace!(listener = %key, "named listener registered");
        listener
    }

    fn retained(&self, key: &ListenerKey) -> Option<Listener<T>> {
        self.slots.read().get(key).and_then(|s| s.retained.clone())
    }

    /// Buffer depth of the listeners this registry creates.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered listeners.
    pub(crate) fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Senders of every listener registered right now.
    fn snapshot(&self) -> Vec<(ListenerKey, mpsc::Sender<T>)> {
        self.slots
            .read()
            .iter()
            .map(|(k, s)| (k.clone(), s.tx.clone()))
            .collect()
    }

    /// Removes listeners whose receivers are all gone.
    fn prune(&self, keys: &[ListenerKey]) {
        let mut slots = self.slots.write();
        for key in keys {
            if slots.get(key).is_some_and(|s| s.tx.is_closed()) {
                slots.remove(key);
                tracing::trace!(listener = %key, "dropped listener pruned");
            }
        }
    }
}

impl<T: Command> Registry<T> {
    /// Delivers `cmd` once to every listener registered when the call started.
    ///
    /// Waits on full listeners, one after the other.
    pub(crate) async fn deliver(&self, cmd: &T, log: &DeliveryLog) {
        let targets = self.snapshot();
        let mut closed = Vec::new();

        for (key, tx) in targets {
            tracing::trace!(listener = %key, ?cmd, "delivering");
            match tx.send(cmd.clone()).await {
                Ok(()) => log.record(&key, cmd),
                Err(_) => closed.push(key),
            }
        }

        if !closed.is_empty() {
            self.prune(&closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::diagnostics::tests::Captured;

    const WINDOW: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn delivers_to_every_listener_once() {
        let reg = Registry::<&'static str>::new(1);
        let a = reg.listen();
        let b = reg.listen();

        reg.deliver(&"ping", &DeliveryLog::null()).await;

        assert_eq!(a.try_recv(), Some("ping"));
        assert_eq!(b.try_recv(), Some("ping"));
        assert_eq!(a.try_recv(), None);
        assert_eq!(b.try_recv(), None);
    }

    #[test]
    fn anonymous_listeners_are_distinct() {
        let reg = Registry::<u8>::new(1);
        let a = reg.listen();
        let b = reg.listen();

        assert!(!a.same_channel(&b));
        assert_ne!(a.key(), b.key());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn named_listeners_are_idempotent() {
        let reg = Registry::<u8>::new(1);
        let a = reg.listen_as(ListenerKey::named("worker"));
        let b = reg.listen_as(ListenerKey::named("worker"));
        let c = reg.listen_as(ListenerKey::named("other"));

        assert!(a.same_channel(&b));
        assert!(!a.same_channel(&c));
        assert_eq!(reg.len(), 2);
    }

    #[tokio::test]
    async fn late_listener_misses_earlier_delivery() {
        let reg = Registry::<u8>::new(1);
        let early = reg.listen();
        reg.deliver(&1, &DeliveryLog::null()).await;
        let late = reg.listen();

        assert_eq!(early.try_recv(), Some(1));
        assert_eq!(late.try_recv(), None);
    }

    #[tokio::test]
    async fn full_listener_blocks_until_drained() {
        let reg = std::sync::Arc::new(Registry::<u8>::new(1));
        let lis = reg.listen();
        reg.deliver(&1, &DeliveryLog::null()).await;

        let r = reg.clone();
        let pending = tokio::spawn(async move { r.deliver(&2, &DeliveryLog::null()).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pending.is_finished());

        assert_eq!(lis.recv().await, Some(1));
        tokio::time::timeout(WINDOW, pending)
            .await
            .expect("delivery should resume")
            .expect("task ok");
        assert_eq!(lis.recv().await, Some(2));
    }

    #[tokio::test]
    async fn registering_is_not_blocked_by_a_stuck_delivery() {
        let reg = std::sync::Arc::new(Registry::<u8>::new(1));
        let _stuck = reg.listen();
        reg.deliver(&1, &DeliveryLog::null()).await;

        let r = reg.clone();
        let _pending = tokio::spawn(async move { r.deliver(&2, &DeliveryLog::null()).await });
        tokio::task::yield_now().await;

        let fresh = tokio::time::timeout(WINDOW, async { reg.listen() })
            .await
            .expect("listen must not wait on delivery");
        assert_eq!(fresh.try_recv(), None);
    }

    #[tokio::test]
    async fn dropped_anonymous_listener_is_pruned() {
        let reg = Registry::<u8>::new(1);
        let keep = reg.listen();
        drop(reg.listen());
        assert_eq!(reg.len(), 2);

        reg.deliver(&1, &DeliveryLog::null()).await;

        assert_eq!(reg.len(), 1);
        assert_eq!(keep.try_recv(), Some(1));
    }

    #[tokio::test]
    async fn dropped_named_listener_is_retained() {
        let reg = Registry::<u8>::new(1);
        drop(reg.listen_as(ListenerKey::named("kept")));

        reg.deliver(&9, &DeliveryLog::null()).await;

        let again = reg.listen_as(ListenerKey::named("kept"));
        assert_eq!(again.try_recv(), Some(9));
    }

    #[tokio::test]
    async fn deliveries_are_logged() {
        let captured = Captured::default();
        let log = DeliveryLog::from_writer(captured.clone());
        let reg = Registry::<u8>::new(1);
        let _lis = reg.listen_as(ListenerKey::named("only"));

        reg.deliver(&5, &log).await;

        assert_eq!(captured.lines(), vec!["Sending 5 to only listener".to_string()]);
    }

    #[tokio::test]
    async fn pruned_listener_is_not_logged() {
        let captured = Captured::default();
        let log = DeliveryLog::from_writer(captured.clone());
        let reg = Registry::<u8>::new(1);
        drop(reg.listen());

        reg.deliver(&5, &log).await;

        assert!(captured.lines().is_empty());
        assert_eq!(reg.len(), 0);
    }
}

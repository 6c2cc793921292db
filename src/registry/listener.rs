//! # Listener: a consumer's receive endpoint.
//!
//! A [`Listener`] is the receiving half of a bounded channel owned by a
//! registry. Clones share the same channel, so two holders of one listener
//! compete for its commands (each command is taken once).
//!
//! ## Example
//! ```rust
//! use conductor::{with_send, Conductor, Simple};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Simple::<u32>::new();
//! let lis = bus.listen();
//!
//! let send = with_send(&bus);
//! tokio::spawn(async move { send.send(7).await });
//!
//! assert_eq!(lis.recv().await, Some(7));
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use super::ListenerKey;

/// Receive endpoint handed to one consumer.
pub struct Listener<T> {
    key: ListenerKey,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Listener<T> {
    pub(crate) fn new(key: ListenerKey, rx: mpsc::Receiver<T>) -> Self {
        Self {
            key,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Waits for the next command.
    ///
    /// Returns `None` only once the owning registry is gone and the buffer is
    /// drained. Cancel-safe: usable as a `tokio::select!` branch.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Takes a buffered command without waiting.
    ///
    /// Returns `None` when nothing is buffered or another clone is receiving.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Identity of this listener inside its registry.
    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    /// True if both handles read from the same channel.
    pub fn same_channel(&self, other: &Listener<T>) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("key", &self.key).finish()
    }
}

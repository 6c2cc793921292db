//! External event sources and the bridge that turns them into sends.
//!
//! ## Contents
//! - [`EventSource`] anything that fires "something happened" repeatedly
//! - [`Signals`] (unix) a set of OS signals, e.g. [`Signals::shutdown`]
//! - [`CtrlC`] Ctrl-C on every platform
//! - `tokio::sync::mpsc` receivers, for in-process triggers
//!
//! ## Bridge
//! ```text
//! loop {
//!   ├─► lifecycle ended      ─► exit
//!   ├─► source exhausted     ─► exit
//!   └─► event                ─► spawn(deliver(cmd.clone()))   (detached)
//! }
//! ```
//! The source does not say which event fired; every event sends the same command.

mod os;

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::Command;
use crate::lifecycle::{Context, Lifecycle};

pub use os::CtrlC;
#[cfg(unix)]
pub use os::{SignalKind, Signals};

/// A stream of anonymous external events.
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Waits for the next event; `None` means no more events will come.
    ///
    /// Must be cancel-safe: the bridge polls it inside `tokio::select!`.
    async fn next_event(&mut self) -> Option<()>;
}

#[async_trait]
impl<E: Send + 'static> EventSource for mpsc::Receiver<E> {
    async fn next_event(&mut self) -> Option<()> {
        self.recv().await.map(|_| ())
    }
}

#[async_trait]
impl<E: Send + 'static> EventSource for mpsc::UnboundedReceiver<E> {
    async fn next_event(&mut self) -> Option<()> {
        self.recv().await.map(|_| ())
    }
}

/// Spawns a bridge that calls `deliver(cmd)` on every event of `source`
/// until `lifecycle` ends or the source is exhausted.
pub(crate) fn spawn_bridge<T, S, F, Fut>(
    lifecycle: Lifecycle,
    cmd: T,
    mut source: S,
    deliver: F,
) -> JoinHandle<()>
where
    T: Command,
    S: EventSource,
    F: Fn(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::debug!(?cmd, "signal bridge started");
        loop {
            tokio::select! {
                biased;
                _ = lifecycle.done() => break,
                ev = source.next_event() => match ev {
                    Some(()) => {
                        tracing::trace!(?cmd, "external event, sending");
                        tokio::spawn(deliver(cmd.clone()));
                    }
                    None => break,
                }
            }
        }
        tracing::debug!(?cmd, "signal bridge stopped");
    })
}

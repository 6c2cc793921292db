//! # Simple conductor: one registry, every listener gets every command.
//!
//! ## Rules
//! - `send` delivers to the listeners registered when it started, in turn,
//!   waiting on any listener whose buffer is full.
//! - `notify` spawns a bridge that sends on every external event until the
//!   lifecycle ends; each send runs detached so the source is never stalled.
//! - `with_lifecycle_policy` spawns a one-shot observer: when the lifecycle
//!   ends the policy decides whether to inject one final command.
//! - Ending the lifecycle never drops buffered commands and never unblocks a
//!   stuck send; it is advisory to the application.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::Command;
use crate::config::DEFAULT_LISTENER_CAPACITY;
use crate::diagnostics::DeliveryLog;
use crate::lifecycle::{CancelHandle, Context, Lifecycle};
use crate::policies::Policy;
use crate::registry::{Listener, ListenerKey, Registry};
use crate::signals::{EventSource, spawn_bridge};

use super::Conductor;
use super::sealed::{Sealed, Variant};

/// Ungrouped command bus.
///
/// Cheap to clone; clones share listeners and lifecycle.
pub struct Simple<T> {
    registry: Arc<Registry<T>>,
    lifecycle: Lifecycle,
    log: DeliveryLog,
    fan_in: Option<Arc<FanInGuard>>,
}

/// Ends a fan-in lifecycle once the last handle holding it is dropped.
struct FanInGuard(CancelHandle);

impl Drop for FanInGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl<T: Command> Simple<T> {
    /// A conductor with a background lifecycle, default capacity and no delivery log.
    pub fn new() -> Self {
        Self::assemble(
            Lifecycle::background(),
            DeliveryLog::null(),
            DEFAULT_LISTENER_CAPACITY,
        )
    }

    /// A conductor whose lifecycle is the one of `parent`.
    ///
    /// Ending `parent` ends this conductor.
    pub fn from_context(parent: &impl Context) -> Self {
        Self::new().with_lifecycle(parent.lifecycle().clone())
    }

    pub(crate) fn assemble(lifecycle: Lifecycle, log: DeliveryLog, capacity: usize) -> Self {
        Self::from_parts(Arc::new(Registry::new(capacity)), lifecycle, log)
    }

    pub(crate) fn from_parts(
        registry: Arc<Registry<T>>,
        lifecycle: Lifecycle,
        log: DeliveryLog,
    ) -> Self {
        Self {
            registry,
            lifecycle,
            log,
            fan_in: None,
        }
    }

    /// Ties `cancel` to this handle and its clones: dropping the last one cancels.
    pub(crate) fn guarded_by(mut self, cancel: CancelHandle) -> Self {
        self.fan_in = Some(Arc::new(FanInGuard(cancel)));
        self
    }

    /// Rebinds this handle to `lifecycle`, keeping its listeners.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Registers a fresh listener.
    pub fn listen(&self) -> Listener<T> {
        self.registry.listen()
    }

    /// Returns the listener named `name`, registering it on first use.
    pub fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T> {
        self.registry.listen_as(ListenerKey::named(name))
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `cmd` once to every currently registered listener.
    pub async fn send(&self, cmd: T) {
        self.registry.deliver(&cmd, &self.log).await;
    }

    /// Sends `cmd` every time `source` fires, until this conductor's lifecycle ends.
    pub fn notify<S: EventSource>(&self, cmd: T, source: S) -> JoinHandle<()> {
        let me = self.clone();
        spawn_bridge(self.lifecycle.clone(), cmd, source, move |cmd| {
            let me = me.clone();
            async move { me.send(cmd).await }
        })
    }

    /// Attaches a shutdown policy, consulted once when the lifecycle ends.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_lifecycle_policy<P: Policy<T>>(self, policy: P) -> Self {
        let me = self.clone();
        tokio::spawn(async move {
            me.done().await;
            match policy.decide() {
                Some(cmd) => {
                    tracing::debug!(?cmd, "shutdown policy injects final command");
                    me.send(cmd).await;
                }
                None => tracing::debug!("shutdown policy declined"),
            }
        });
        self
    }

    pub(crate) fn registry(&self) -> &Arc<Registry<T>> {
        &self.registry
    }

    pub(crate) fn log(&self) -> &DeliveryLog {
        &self.log
    }
}

impl<T: Command> Default for Simple<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Simple<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            lifecycle: self.lifecycle.clone(),
            log: self.log.clone(),
            fan_in: self.fan_in.clone(),
        }
    }
}

impl<T> fmt::Debug for Simple<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simple")
            .field("listeners", &self.registry.len())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl<T> Context for Simple<T> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl<T: Command> Conductor<T> for Simple<T> {
    fn listen(&self) -> Listener<T> {
        Simple::listen(self)
    }

    fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T> {
        Simple::listen_as(self, name)
    }
}

impl<T: Command> Sealed<T> for Simple<T> {
    fn variant(&self) -> Variant<'_, T> {
        Variant::Simple(self)
    }

    fn rebind(&self, lifecycle: Lifecycle) -> Self {
        self.clone().with_lifecycle(lifecycle)
    }
}

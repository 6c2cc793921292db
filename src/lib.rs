//! # conductor
//!
//! **Conductor** is an in-process command broadcast bus for tokio programs.
//!
//! Producers send typed commands; every registered listener receives its own
//! copy. A conductor owns a cancellation scope ([`Lifecycle`]) and is itself a
//! [`Context`], so it can be handed to anything that waits on cancellation.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer ──► Sender::send(cmd) ─┐
//!   OS signal ──► Notifier bridge ──┤
//!   lifecycle end ──► policy ───────┤
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Simple<T>                         Tagged<T>                      │
//! │  - one Registry                    - tag ─► Registry (lazy)       │
//! │  - send: every listener            - send(tags): named partitions │
//! │                                    - broadcast: every partition   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   [Listener #1]      [Listener #2]     [Listener "worker"]
//!   (bounded mpsc)     (bounded mpsc)    (named, idempotent)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Simple::new() / Tagged::new()   (background lifecycle)
//!   ├─► with_cancel(&c)    ─► (c', CancelHandle)   shares registries
//!   ├─► with_timeout(&c, d)
//!   └─► with_deadline(&c, at)
//!
//! end of c' ─► policy.decide() ─► Some(cmd) ─► one final send
//!           ─► notify bridges of c' stop
//!           ─► c'.done() resolves
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / functions                      |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Conductors**    | Ungrouped and tag-partitioned buses.                     | [`Simple`], [`Tagged`], [`Conductor`]      |
//! | **Listeners**     | Per-consumer bounded channels, fresh or named.           | [`Listener`], [`ListenerKey`]              |
//! | **Producers**     | Send handles resolved from any conductor.                | [`with_send`], [`with_tagged_send`]        |
//! | **Bridging**      | Turn OS signals (or any event source) into sends.        | [`with_notify`], [`EventSource`]           |
//! | **Lifecycles**    | Cancel, deadline and timeout scopes.                     | [`with_cancel`], [`with_timeout`]          |
//! | **Policies**      | Final command injected when a lifecycle ends.            | [`ConstantPolicy`], [`SetPolicy`]          |
//! | **Configuration** | Listener depth and delivery log.                         | [`ConductorConfig`], [`Builder`]           |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use conductor::{with_send, with_timeout, Conductor, ConstantPolicy, Context, Simple};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action { Pause, Stop }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (bus, _cancel) = with_timeout(&Simple::<Action>::new(), Duration::from_millis(20));
//!     let bus = bus.with_lifecycle_policy(ConstantPolicy::new(Action::Stop));
//!
//!     let worker = bus.listen();
//!     let send = with_send(&bus);
//!     tokio::spawn(async move { send.send(Action::Pause).await });
//!
//!     assert_eq!(worker.recv().await, Some(Action::Pause));
//!     assert_eq!(worker.recv().await, Some(Action::Stop));
//!     assert!(bus.is_done());
//! }
//! ```

mod conductor;
mod config;
mod diagnostics;
mod error;
mod lifecycle;
mod policies;
mod registry;
mod signals;

use std::fmt::Debug;

// ---- Public re-exports ----

pub use conductor::{
    Builder, Conductor, Notifier, Sender, Simple, TagScope, Tagged, with_cancel, with_deadline,
    with_notify, with_send, with_tag, with_tagged_notify, with_tagged_send, with_tags,
    with_timeout,
};
pub use config::{ConductorConfig, DEFAULT_LISTENER_CAPACITY};
pub use error::{ConductorError, LifecycleError};
pub use lifecycle::{CancelHandle, Context, Lifecycle};
pub use policies::{ConstantPolicy, Policy, SetPolicy, TaggedPolicy};
pub use registry::{Listener, ListenerKey};
pub use signals::{CtrlC, EventSource};
#[cfg(unix)]
pub use signals::{SignalKind, Signals};

/// Values that can travel through a conductor.
///
/// Blanket-implemented; `Debug` is required by the delivery log.
pub trait Command: Clone + Debug + Send + Sync + 'static {}

impl<T> Command for T where T: Clone + Debug + Send + Sync + 'static {}

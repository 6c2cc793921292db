//! Conductors: the two bus variants and everything that dispatches on them.
//!
//! ## Contents
//! - [`Simple`] one registry; `send` reaches every listener
//! - [`Tagged`] one registry per tag; `send` to named tags or `broadcast`
//! - [`TagScope`] a tagged conductor narrowed to one tag
//! - [`Conductor`] sealed trait implemented by exactly `Simple` and `Tagged`
//! - [`Sender`] / [`Notifier`] producer handles resolved by variant
//! - [`with_cancel`], [`with_deadline`], [`with_timeout`] lifecycle scoping
//! - [`Builder`] construction from [`ConductorConfig`](crate::ConductorConfig)
//!
//! ## Variant dispatch
//! ```text
//! with_send(&c)            Simple ─► send          Tagged ─► broadcast
//! with_notify(&c)          Simple ─► notify        Tagged ─► notify_all
//! with_tagged_send(&c, ..) Simple ─► PANIC         Tagged ─► send(tags)
//! with_tagged_notify(..)   Simple ─► PANIC         Tagged ─► notify_tagged
//! with_tag / with_tags     Simple ─► PANIC         Tagged ─► scope / fan-in
//! ```
//! Panics mark contract violations: the caller statically expected the other
//! variant. They are never turned into recoverable errors.

mod builder;
mod compose;
mod handles;
mod simple;
mod tagged;

use std::borrow::Cow;

use crate::Command;
use crate::lifecycle::Context;
use crate::registry::Listener;

pub use builder::Builder;
pub use compose::{with_cancel, with_deadline, with_timeout};
pub use handles::{
    Notifier, Sender, with_notify, with_send, with_tag, with_tagged_notify, with_tagged_send,
    with_tags,
};
pub use simple::Simple;
pub use tagged::{TagScope, Tagged};

/// A command bus: either a [`Simple`] or a [`Tagged`] conductor.
///
/// Sealed; no other implementations exist, which is what lets the `with_*`
/// accessors dispatch exhaustively.
pub trait Conductor<T: Command>:
    Context + Clone + Send + Sync + 'static + sealed::Sealed<T>
{
    /// Registers a fresh listener (the untagged partition for [`Tagged`]).
    fn listen(&self) -> Listener<T>;

    /// Returns the listener registered under `name`, registering it on first use.
    fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T>;
}

pub(crate) mod sealed {
    use super::{Simple, Tagged};
    use crate::lifecycle::Lifecycle;

    /// Borrowed view of the concrete variant behind a conductor.
    pub enum Variant<'a, T> {
        Simple(&'a Simple<T>),
        Tagged(&'a Tagged<T>),
    }

    pub trait Sealed<T> {
        fn variant(&self) -> Variant<'_, T>;

        /// Same registries, different lifecycle.
        fn rebind(&self, lifecycle: Lifecycle) -> Self
        where
            Self: Sized;
    }
}

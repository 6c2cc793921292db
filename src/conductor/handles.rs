//! # Producer handles and variant-specific accessors.
//!
//! [`Sender`] and [`Notifier`] are resolved once from a conductor and then
//! used without knowing which variant they came from.
//!
//! ## Example
//! ```rust
//! use conductor::{with_tag, with_tagged_send, Tagged};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Tagged::<&'static str>::new();
//! let first = with_tag(&bus, "first").listen();
//! let second = with_tag(&bus, "second").listen();
//!
//! with_tagged_send(&bus, ["first"]).send("ciao").await;
//!
//! assert_eq!(first.try_recv(), Some("ciao"));
//! assert_eq!(second.try_recv(), None);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::Command;
use crate::signals::EventSource;

use super::sealed::Variant;
use super::{Conductor, Simple, TagScope, Tagged};

/// Where a resolved handle delivers.
enum Target<T> {
    Simple(Simple<T>),
    Broadcast(Tagged<T>),
    Tags(Tagged<T>, Arc<[String]>),
}

impl<T> Clone for Target<T> {
    fn clone(&self) -> Self {
        match self {
            Target::Simple(s) => Target::Simple(s.clone()),
            Target::Broadcast(t) => Target::Broadcast(t.clone()),
            Target::Tags(t, tags) => Target::Tags(t.clone(), Arc::clone(tags)),
        }
    }
}

impl<T> fmt::Debug for Target<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Simple(_) => f.write_str("Simple"),
            Target::Broadcast(_) => f.write_str("Broadcast"),
            Target::Tags(_, tags) => f.debug_tuple("Tags").field(tags).finish(),
        }
    }
}

/// Sends commands into the conductor it was resolved from.
#[derive(Clone, Debug)]
pub struct Sender<T> {
    target: Target<T>,
}

impl<T: Command> Sender<T> {
    /// Delivers `cmd`; waits while any target listener is full.
    pub async fn send(&self, cmd: T) {
        match &self.target {
            Target::Simple(s) => s.send(cmd).await,
            Target::Broadcast(t) => t.broadcast(cmd).await,
            Target::Tags(t, tags) => t.send(cmd, &tags[..]).await,
        }
    }
}

/// Bridges external events into sends on the conductor it was resolved from.
#[derive(Clone, Debug)]
pub struct Notifier<T> {
    target: Target<T>,
}

impl<T: Command> Notifier<T> {
    /// Sends `cmd` on every event of `source` until the conductor's lifecycle ends.
    pub fn notify<S: EventSource>(&self, cmd: T, source: S) -> JoinHandle<()> {
        match &self.target {
            Target::Simple(s) => s.notify(cmd, source),
            Target::Broadcast(t) => t.notify_all(cmd, source),
            Target::Tags(t, tags) => t.notify_tagged(cmd, tags.to_vec(), source),
        }
    }
}

fn collect_tags<I, S>(tags: I) -> Arc<[String]>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}

/// Resolves a send handle: `send` for a simple conductor, `broadcast` for a tagged one.
pub fn with_send<T: Command, C: Conductor<T>>(conductor: &C) -> Sender<T> {
    let target = match conductor.variant() {
        Variant::Simple(s) => Target::Simple(s.clone()),
        Variant::Tagged(t) => Target::Broadcast(t.clone()),
    };
    Sender { target }
}

/// Resolves a send handle targeting `tags` of a tagged conductor.
///
/// # Panics
/// If `conductor` is a [`Simple`] conductor.
pub fn with_tagged_send<T, C, I, S>(conductor: &C, tags: I) -> Sender<T>
where
    T: Command,
    C: Conductor<T>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    match conductor.variant() {
        Variant::Tagged(t) => Sender {
            target: Target::Tags(t.clone(), collect_tags(tags)),
        },
        Variant::Simple(_) => panic!("simple conductor does not support tagged send"),
    }
}

/// Resolves a notify handle: `notify` for a simple conductor, `notify_all` for a tagged one.
pub fn with_notify<T: Command, C: Conductor<T>>(conductor: &C) -> Notifier<T> {
    let target = match conductor.variant() {
        Variant::Simple(s) => Target::Simple(s.clone()),
        Variant::Tagged(t) => Target::Broadcast(t.clone()),
    };
    Notifier { target }
}

/// Resolves a notify handle targeting `tags` of a tagged conductor.
///
/// # Panics
/// If `conductor` is a [`Simple`] conductor.
pub fn with_tagged_notify<T, C, I, S>(conductor: &C, tags: I) -> Notifier<T>
where
    T: Command,
    C: Conductor<T>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    match conductor.variant() {
        Variant::Tagged(t) => Notifier {
            target: Target::Tags(t.clone(), collect_tags(tags)),
        },
        Variant::Simple(_) => panic!("simple conductor does not support tagged notification"),
    }
}

/// Narrows a tagged conductor to `tag`.
///
/// # Panics
/// If `conductor` is a [`Simple`] conductor.
pub fn with_tag<T, C>(conductor: &C, tag: impl Into<String>) -> TagScope<T>
where
    T: Command,
    C: Conductor<T>,
{
    match conductor.variant() {
        Variant::Tagged(t) => t.with_tag(tag),
        Variant::Simple(_) => panic!("not a tagged conductor"),
    }
}

/// Merges the named partitions of a tagged conductor into one simple conductor.
///
/// # Panics
/// If `conductor` is a [`Simple`] conductor.
pub fn with_tags<T, C, I, S>(conductor: &C, tags: I) -> Simple<T>
where
    T: Command,
    C: Conductor<T>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    match conductor.variant() {
        Variant::Tagged(t) => t.with_tags(tags),
        Variant::Simple(_) => panic!("not a tagged conductor"),
    }
}

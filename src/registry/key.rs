//! Listener identities.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Process-wide counter for anonymous listener ids.
static LISTENER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Identity of a listener inside one registry.
///
/// - [`ListenerKey::Anonymous`] is issued by `listen()`; every call gets a new one.
/// - [`ListenerKey::Named`] is chosen by the caller via `listen_as()`; the same
///   name on the same registry always yields the same channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKey {
    /// Fresh, never reused id.
    Anonymous(u64),
    /// Caller-chosen stable name.
    Named(Cow<'static, str>),
}

impl ListenerKey {
    /// Issues a new anonymous key.
    pub fn fresh() -> Self {
        ListenerKey::Anonymous(LISTENER_SEQ.fetch_add(1, AtomicOrdering::Relaxed) + 1)
    }

    /// Builds a named key.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        ListenerKey::Named(name.into())
    }

    /// True for keys issued by [`ListenerKey::fresh`].
    pub fn is_anonymous(&self) -> bool {
        matches!(self, ListenerKey::Anonymous(_))
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKey::Anonymous(id) => write!(f, "#{id}"),
            ListenerKey::Named(name) => f.write_str(name),
        }
    }
}

impl From<&'static str> for ListenerKey {
    fn from(name: &'static str) -> Self {
        ListenerKey::named(name)
    }
}

impl From<String> for ListenerKey {
    fn from(name: String) -> Self {
        ListenerKey::named(name)
    }
}

//! # Cancellation scopes.
//!
//! [`Lifecycle`] wraps a [`CancellationToken`] with the bits a cancellation
//! context carries besides "is it over": a deadline, the reason it ended, and
//! an optional typed value.
//!
//! ## Rules
//! - Derived scopes use `child_token()`: ending a parent ends every descendant,
//!   ending a child never touches its parent.
//! - A derived deadline is the earlier of the parent's and the requested one.
//! - Deadlines are enforced by a timer task that exits early on cancellation.
//! - The first end reason wins; an inherited end reports the ancestor's reason.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::LifecycleError;

use super::Context;

struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: OnceLock<LifecycleError>,
    parent: Option<Lifecycle>,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

/// A cancellation scope.
///
/// Cheap to clone: clones observe and control the same scope.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    /// A root scope that never ends on its own and has no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                deadline: None,
                reason: OnceLock::new(),
                parent: None,
                value: None,
            }),
        }
    }

    /// Derives a child scope ended by the returned handle (or by its parent).
    pub fn with_cancel(parent: &impl Context) -> (Self, CancelHandle) {
        let parent = parent.lifecycle();
        let child = Self::derive(parent, parent.deadline_at(), None);
        let handle = CancelHandle::new(child.clone());
        (child, handle)
    }

    /// Derives a child scope that also ends at `at`.
    ///
    /// If `at` is already in the past the child is returned ended.
    pub fn with_deadline(parent: &impl Context, at: Instant) -> (Self, CancelHandle) {
        let parent = parent.lifecycle();
        let inherited = parent.deadline_at();
        let effective = match inherited {
            Some(p) if p <= at => p,
            _ => at,
        };
        let child = Self::derive(parent, Some(effective), None);
        if inherited.is_none_or(|p| at < p) {
            child.arm(at);
        }
        let handle = CancelHandle::new(child.clone());
        (child, handle)
    }

    /// Derives a child scope that also ends after `timeout`.
    pub fn with_timeout(parent: &impl Context, timeout: Duration) -> (Self, CancelHandle) {
        Self::with_deadline(parent, Instant::now() + timeout)
    }

    /// Derives a child scope carrying `value`, retrievable via [`Context::value`].
    ///
    /// A value of the same type attached closer to the child shadows this one.
    pub fn with_value<V>(parent: &impl Context, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        let parent = parent.lifecycle();
        Self::derive(parent, parent.deadline_at(), Some(Arc::new(value)))
    }

    fn derive(
        parent: &Lifecycle,
        deadline: Option<Instant>,
        value: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: parent.inner.token.child_token(),
                deadline,
                reason: OnceLock::new(),
                parent: Some(parent.clone()),
                value,
            }),
        }
    }

    /// Spawns the timer that ends this scope at `at`.
    fn arm(&self, at: Instant) {
        if Instant::now() >= at {
            self.end(LifecycleError::DeadlineExceeded);
            return;
        }
        let me = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = me.inner.token.cancelled() => {}
                _ = tokio::time::sleep_until(at) => {
                    tracing::debug!("lifecycle deadline reached");
                    me.end(LifecycleError::DeadlineExceeded);
                }
            }
        });
    }

    fn end(&self, reason: LifecycleError) {
        if !self.inner.token.is_cancelled() {
            let _ = self.inner.reason.set(reason);
        }
        self.inner.token.cancel();
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub(crate) fn deadline_at(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub(crate) fn end_reason(&self) -> Option<LifecycleError> {
        if !self.inner.token.is_cancelled() {
            return None;
        }
        if let Some(reason) = self.inner.reason.get() {
            return Some(*reason);
        }
        match &self.inner.parent {
            Some(parent) if parent.inner.token.is_cancelled() => parent.end_reason(),
            _ => Some(LifecycleError::Canceled),
        }
    }

    pub(crate) fn lookup<V>(&self) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        let mut cursor = Some(self);
        while let Some(scope) = cursor {
            if let Some(value) = &scope.inner.value {
                if let Ok(v) = Arc::clone(value).downcast::<V>() {
                    return Some(v);
                }
            }
            cursor = scope.inner.parent.as_ref();
        }
        None
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::background()
    }
}

impl Context for Lifecycle {
    fn lifecycle(&self) -> &Lifecycle {
        self
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("deadline", &self.inner.deadline)
            .field("done", &self.inner.token.is_cancelled())
            .field("err", &self.end_reason())
            .finish()
    }
}

/// Ends the scope it was issued for.
///
/// Dropping the handle does **not** cancel anything.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    scope: Lifecycle,
}

impl CancelHandle {
    fn new(scope: Lifecycle) -> Self {
        Self { scope }
    }

    /// Ends the scope (and its descendants). Idempotent.
    pub fn cancel(&self) {
        self.scope.end(LifecycleError::Canceled);
    }

    /// True once the scope has ended, for whatever reason.
    pub fn is_cancelled(&self) -> bool {
        self.scope.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn cancel_ends_scope() {
        let (scope, cancel) = Lifecycle::with_cancel(&Lifecycle::background());
        tokio::spawn(async move { cancel.cancel() });

        tokio::time::timeout(WINDOW, scope.done())
            .await
            .expect("scope should end");
        assert_eq!(scope.err(), Some(LifecycleError::Canceled));
    }

    #[tokio::test]
    async fn child_cancel_leaves_parent_running() {
        let (parent, _parent_cancel) = Lifecycle::with_cancel(&Lifecycle::background());
        let (child, child_cancel) = Lifecycle::with_cancel(&parent);

        child_cancel.cancel();

        assert!(child.is_done());
        assert!(!parent.is_done());
        assert_eq!(parent.err(), None);
    }

    #[tokio::test]
    async fn parent_cancel_ends_child_with_inherited_reason() {
        let (parent, parent_cancel) = Lifecycle::with_cancel(&Lifecycle::background());
        let (child, _child_cancel) = Lifecycle::with_timeout(&parent, Duration::from_secs(60));

        parent_cancel.cancel();

        tokio::time::timeout(WINDOW, child.done())
            .await
            .expect("child should end with parent");
        assert_eq!(child.err(), Some(LifecycleError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_no_earlier_than_requested() {
        let delta = Duration::from_millis(25);
        let start = Instant::now();
        let (scope, _cancel) = Lifecycle::with_timeout(&Lifecycle::background(), delta);

        tokio::time::timeout(2 * delta, scope.done())
            .await
            .expect("timeout should fire");

        let elapsed = start.elapsed();
        assert!(elapsed >= delta, "fired early: {elapsed:?}");
        assert!(elapsed < 2 * delta, "fired late: {elapsed:?}");
        assert_eq!(scope.err(), Some(LifecycleError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_not_extended_past_parent() {
        let (parent, _c1) =
            Lifecycle::with_timeout(&Lifecycle::background(), Duration::from_millis(10));
        let (child, _c2) = Lifecycle::with_timeout(&parent, Duration::from_secs(10));

        assert_eq!(child.deadline(), parent.deadline());

        child.done().await;
        assert_eq!(child.err(), Some(LifecycleError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn past_deadline_is_ended_immediately() {
        let at = Instant::now() - Duration::from_millis(1);
        let (scope, _cancel) = Lifecycle::with_deadline(&Lifecycle::background(), at);

        assert!(scope.is_done());
        assert_eq!(scope.err(), Some(LifecycleError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn explicit_cancel_before_deadline_reports_canceled() {
        let (scope, cancel) =
            Lifecycle::with_timeout(&Lifecycle::background(), Duration::from_secs(60));
        cancel.cancel();
        assert_eq!(scope.err(), Some(LifecycleError::Canceled));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn values_are_found_up_the_chain_and_shadowed() {
        #[derive(Debug, PartialEq)]
        struct RequestId(u32);

        let root = Lifecycle::with_value(&Lifecycle::background(), RequestId(1));
        let mid = Lifecycle::with_value(&root, "unrelated");
        let leaf = Lifecycle::with_value(&mid, RequestId(2));

        assert_eq!(mid.value::<RequestId>().as_deref(), Some(&RequestId(1)));
        assert_eq!(leaf.value::<RequestId>().as_deref(), Some(&RequestId(2)));
        assert_eq!(leaf.value::<&'static str>().as_deref(), Some(&"unrelated"));
        assert!(root.value::<u64>().is_none());
    }

    #[test]
    fn background_has_no_deadline_and_no_error() {
        let root = Lifecycle::background();
        assert!(root.deadline().is_none());
        assert!(!root.is_done());
        assert!(root.err().is_none());
    }
}

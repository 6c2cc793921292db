//! # The context capability.
//!
//! [`Context`] is implemented by [`Lifecycle`] and by every conductor handle.
//! Only [`Context::lifecycle`] is required; everything else delegates to it, so
//! a conductor answers `deadline`/`done`/`err`/`value` exactly as the lifecycle
//! it owns would.

use std::any::Any;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture, WaitForCancellationFutureOwned};

use crate::error::LifecycleError;

use super::Lifecycle;

/// Cancellation-context capability.
///
/// ## Example
/// ```rust
/// use conductor::{Context, Lifecycle, Simple};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = Simple::<&'static str>::new();
/// let (scope, cancel) = Lifecycle::with_cancel(&bus);
/// cancel.cancel();
/// scope.done().await;
/// assert!(scope.err().is_some());
/// assert!(!bus.is_done());
/// # }
/// ```
pub trait Context {
    /// The lifecycle this value delegates to.
    fn lifecycle(&self) -> &Lifecycle;

    /// Instant at which the lifecycle ends on its own, if any.
    fn deadline(&self) -> Option<Instant> {
        self.lifecycle().deadline_at()
    }

    /// Completes once the lifecycle has ended.
    fn done(&self) -> WaitForCancellationFuture<'_> {
        self.lifecycle().token().cancelled()
    }

    /// Like [`Context::done`] but not tied to a borrow; suitable for spawned tasks.
    fn done_owned(&self) -> WaitForCancellationFutureOwned {
        self.lifecycle().token().clone().cancelled_owned()
    }

    /// True once the lifecycle has ended.
    fn is_done(&self) -> bool {
        self.lifecycle().token().is_cancelled()
    }

    /// Why the lifecycle ended; `None` while it is still running.
    fn err(&self) -> Option<LifecycleError> {
        self.lifecycle().end_reason()
    }

    /// Looks up a value of type `V` attached to this scope or any ancestor.
    fn value<V>(&self) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
        Self: Sized,
    {
        self.lifecycle().lookup::<V>()
    }

    /// A token that is cancelled when this lifecycle ends.
    ///
    /// Cancelling the returned token does not end the lifecycle.
    fn child_token(&self) -> CancellationToken {
        self.lifecycle().token().child_token()
    }
}

//! # Lifecycle scoping for conductors.
//!
//! Each function returns a **new handle of the same variant** that shares the
//! source listeners/partitions and owns a child lifecycle, plus the
//! [`CancelHandle`] for that child only.
//!
//! ```text
//! (child, cancel) = with_timeout(&parent, 25ms)
//!
//! parent ─┬─ registry (shared) ─┬─ child
//!         │                     │
//!   Lifecycle P  ──child_token──► Lifecycle C  (+ timer at now+25ms)
//!
//! cancel()        ─► C ends, P keeps running
//! P ends          ─► C ends
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::Command;
use crate::lifecycle::{CancelHandle, Lifecycle};

use super::Conductor;

/// Derives a conductor that ends when `cancel` is called or `conductor` ends.
pub fn with_cancel<T: Command, C: Conductor<T>>(conductor: &C) -> (C, CancelHandle) {
    let (lifecycle, cancel) = Lifecycle::with_cancel(conductor);
    (conductor.rebind(lifecycle), cancel)
}

/// Derives a conductor that also ends at `deadline`.
pub fn with_deadline<T: Command, C: Conductor<T>>(
    conductor: &C,
    deadline: Instant,
) -> (C, CancelHandle) {
    let (lifecycle, cancel) = Lifecycle::with_deadline(conductor, deadline);
    (conductor.rebind(lifecycle), cancel)
}

/// Derives a conductor that also ends after `timeout`.
pub fn with_timeout<T: Command, C: Conductor<T>>(
    conductor: &C,
    timeout: Duration,
) -> (C, CancelHandle) {
    let (lifecycle, cancel) = Lifecycle::with_timeout(conductor, timeout);
    (conductor.rebind(lifecycle), cancel)
}

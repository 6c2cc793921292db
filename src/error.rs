//! Error types used by conductors and their lifecycles.
//!
//! This module defines two enums:
//!
//! - [`ConductorError`]: operational failures while building a conductor or
//!   attaching an external event source.
//! - [`LifecycleError`]: why a lifecycle ended (like the `err()` of a
//!   cancellation context).
//!
//! Contract violations (e.g. a tag operation on a simple conductor) are **not**
//! represented here: they panic, because they indicate a caller bug.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced while constructing or wiring a conductor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConductorError {
    /// The configured delivery log could not be created.
    #[error("cannot open delivery log {path:?}: {source}")]
    DeliveryLog {
        /// Path taken from [`ConductorConfig::delivery_log`](crate::ConductorConfig).
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Registering interest in an OS signal failed.
    #[error("cannot register signal handler: {0}")]
    Signal(#[source] io::Error),
}

impl ConductorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conductor::ConductorError;
    ///
    /// let err = ConductorError::Signal(std::io::Error::other("nope"));
    /// assert_eq!(err.as_label(), "conductor_signal");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConductorError::DeliveryLog { .. } => "conductor_delivery_log",
            ConductorError::Signal(_) => "conductor_signal",
        }
    }
}

/// # Reason a lifecycle ended.
///
/// Returned by [`Context::err`](crate::Context::err) once the lifecycle is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// Ended by an explicit cancel (own or inherited).
    #[error("lifecycle canceled")]
    Canceled,
    /// Ended because its deadline passed.
    #[error("lifecycle deadline exceeded")]
    DeadlineExceeded,
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::Canceled => "lifecycle_canceled",
            LifecycleError::DeadlineExceeded => "lifecycle_deadline_exceeded",
        }
    }
}

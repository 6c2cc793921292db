//! Lifecycles: cancellation scopes owned by conductors.
//!
//! Every conductor owns a [`Lifecycle`], and every conductor **is** a
//! [`Context`]: it can be handed to any code that waits for cancellation,
//! reads a deadline, or derives a narrower scope.
//!
//! ## Contents
//! - [`Lifecycle`] cancellation scope with optional deadline and typed value
//! - [`CancelHandle`] ends one scope (and its descendants) explicitly
//! - [`Context`] the capability shared by lifecycles and conductors
//!
//! ## Scope tree
//! ```text
//! Lifecycle::background()
//!   └─► with_cancel(&parent)         ─► (child, CancelHandle)
//!         └─► with_timeout(&child, d) ─► (grandchild, CancelHandle)
//!
//! cancel(parent) ──► ends child ──► ends grandchild
//! cancel(grandchild) ─► parent and child unaffected
//! ```

mod context;
mod scope;

pub use context::Context;
pub use scope::{CancelHandle, Lifecycle};

//! Shutdown policies.
//!
//! A policy decides, once, whether a conductor injects a final command when
//! its lifecycle ends.
//!
//! ## Contents
//! - [`Policy`] decision for a [`Simple`](crate::Simple) conductor
//! - [`TaggedPolicy`] per-partition decision for a [`Tagged`](crate::Tagged) conductor
//! - [`ConstantPolicy`] always the same command (both kinds)
//! - [`SetPolicy`] a command per tag; unlisted tags get nothing
//!
//! ## Quick wiring
//! ```text
//! Simple::with_lifecycle_policy(p)  ─► on end: p.decide()         ─► Some(cmd) ─► send(cmd)
//! Tagged::with_lifecycle_policy(p)  ─► on end, per partition tag:
//!                                        p.decide(tag)            ─► Some(cmd) ─► send to that tag only
//! ```
//!
//! Closures work too: `Fn() -> Option<T>` is a [`Policy`], and
//! `Fn(&str) -> Option<T>` is a [`TaggedPolicy`].

mod constant;
mod policy;
mod set;

pub use constant::ConstantPolicy;
pub use policy::{Policy, TaggedPolicy};
pub use set::SetPolicy;

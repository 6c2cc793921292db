//! # Constant policy.
//!
//! [`ConstantPolicy`] injects the same command on every decision: once for a
//! simple conductor, once per partition for a tagged one.
//!
//! ## Example
//! ```rust
//! use conductor::{ConstantPolicy, Policy, TaggedPolicy};
//!
//! let p = ConstantPolicy::new("stop");
//! assert_eq!(Policy::decide(&p), Some("stop"));
//! assert_eq!(TaggedPolicy::decide(&p, "any-tag"), Some("stop"));
//! ```

use super::{Policy, TaggedPolicy};

/// Always injects a clone of the wrapped command.
#[derive(Clone, Debug)]
pub struct ConstantPolicy<T> {
    cmd: T,
}

impl<T> ConstantPolicy<T> {
    pub fn new(cmd: T) -> Self {
        Self { cmd }
    }
}

impl<T> Policy<T> for ConstantPolicy<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn decide(&self) -> Option<T> {
        Some(self.cmd.clone())
    }
}

impl<T> TaggedPolicy<T> for ConstantPolicy<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn decide(&self, _tag: &str) -> Option<T> {
        Some(self.cmd.clone())
    }
}

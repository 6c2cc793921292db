//! # Per-tag policy.
//!
//! [`SetPolicy`] maps tags to final commands. Partitions whose tag is not in
//! the table receive nothing.
//!
//! ## Example
//! ```rust
//! use conductor::{SetPolicy, TaggedPolicy};
//!
//! let p = SetPolicy::from_iter([("first", "ciao"), ("second", "miao")]);
//! assert_eq!(p.decide("first"), Some("ciao"));
//! assert_eq!(p.decide("third"), None);
//! ```

use std::collections::HashMap;

use super::TaggedPolicy;

/// Table-driven tagged policy.
#[derive(Clone, Debug)]
pub struct SetPolicy<T> {
    table: HashMap<String, T>,
}

impl<T> Default for SetPolicy<T> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<T> SetPolicy<T> {
    pub fn new(table: HashMap<String, T>) -> Self {
        Self { table }
    }

    /// Adds or replaces the command for `tag`.
    pub fn with(mut self, tag: impl Into<String>, cmd: T) -> Self {
        self.table.insert(tag.into(), cmd);
        self
    }
}

impl<K, T> FromIterator<(K, T)> for SetPolicy<T>
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<T> TaggedPolicy<T> for SetPolicy<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn decide(&self, tag: &str) -> Option<T> {
        self.table.get(tag).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_partition_can_be_listed() {
        let p = SetPolicy::default().with("", 0u8).with("x", 1);
        assert_eq!(p.decide(""), Some(0));
        assert_eq!(p.decide("x"), Some(1));
        assert_eq!(p.decide("y"), None);
    }
}

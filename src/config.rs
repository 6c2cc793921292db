//! # Conductor configuration.
//!
//! Provides [`ConductorConfig`], the settings a conductor is built with.
//!
//! Config is consumed once, at construction (see [`Builder`](crate::Builder)).
//! Derived conductors (cancel/deadline/timeout scopes, tag scopes, fan-in)
//! inherit the settings and the already opened delivery log of their origin.
//!
//! ## Sentinel values
//! - `listener_capacity = 0` → treated as 1 (a listener always buffers one command)
//! - `delivery_log = None` → deliveries are not recorded (null sink)

use std::path::PathBuf;

/// Default per-listener buffer depth.
pub const DEFAULT_LISTENER_CAPACITY: usize = 1;

/// Configuration for a conductor.
///
/// ## Field semantics
/// - `listener_capacity`: buffer depth of every listener channel (min 1)
/// - `delivery_log`: file that receives one line per delivered command
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Buffer depth of each listener channel.
    ///
    /// A send into a full listener waits until the consumer drains it; this is
    /// the only back-pressure the bus applies.
    pub listener_capacity: usize,

    /// Optional delivery log file.
    ///
    /// Created (truncated) at construction. Failing to create it makes
    /// construction fail with [`ConductorError::DeliveryLog`](crate::ConductorError::DeliveryLog).
    pub delivery_log: Option<PathBuf>,
}

impl ConductorConfig {
    /// Returns the listener capacity clamped to a minimum of 1.
    #[inline]
    pub fn listener_capacity_clamped(&self) -> usize {
        self.listener_capacity.max(1)
    }
}

impl Default for ConductorConfig {
    /// Default configuration:
    ///
    /// - `listener_capacity = 1`
    /// - `delivery_log = None`
    fn default() -> Self {
        Self {
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
            delivery_log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = ConductorConfig {
            listener_capacity: 0,
            ..ConductorConfig::default()
        };
        assert_eq!(cfg.listener_capacity_clamped(), 1);
    }

    #[test]
    fn defaults() {
        let cfg = ConductorConfig::default();
        assert_eq!(cfg.listener_capacity_clamped(), DEFAULT_LISTENER_CAPACITY);
        assert!(cfg.delivery_log.is_none());
    }
}

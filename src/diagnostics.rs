//! # Delivery log.
//!
//! [`DeliveryLog`] records one line per delivered command into a sink chosen
//! at construction. Without a sink (the default) nothing is formatted or
//! written.
//!
//! ## Output format
//! ```text
//! Sending Pause to #3 listener
//! Sending Stop to worker-1 listener
//! ```
//!
//! Write failures after construction are ignored; only failing to open the
//! configured file is an error (see [`ConductorError::DeliveryLog`]).

use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ConductorError;
use crate::registry::ListenerKey;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared handle to the delivery sink; clones write to the same sink.
#[derive(Clone, Default)]
pub(crate) struct DeliveryLog {
    sink: Option<Sink>,
}

impl DeliveryLog {
    /// Discards everything.
    pub(crate) fn null() -> Self {
        Self { sink: None }
    }

    /// Creates (or truncates) `path` and writes to it.
    pub(crate) fn open(path: &Path) -> Result<Self, ConductorError> {
        let file = File::create(path).map_err(|source| ConductorError::DeliveryLog {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "delivery log opened");
        Ok(Self::from_writer(file))
    }

    /// Writes to an arbitrary sink.
    pub(crate) fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    /// Records one delivery of `cmd` to the listener `key`.
    pub(crate) fn record<T: Debug>(&self, key: &ListenerKey, cmd: &T) {
        if let Some(sink) = &self.sink {
            let mut w = sink.lock();
            let _ = writeln!(w, "Sending {cmd:?} to {key} listener");
        }
    }
}

use std::io::Write;

use crate::Command;
use crate::config::ConductorConfig;
use crate::diagnostics::DeliveryLog;
use crate::error::ConductorError;
use crate::lifecycle::{Context, Lifecycle};

use super::{Simple, Tagged};

/// Builder for constructing a conductor from a [`ConductorConfig`].
///
/// ```rust
/// use conductor::{Builder, ConductorConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), conductor::ConductorError> {
/// let bus = Builder::new(ConductorConfig::default()).simple::<&'static str>()?;
/// let lis = bus.listen();
///
/// bus.send("ciao").await;
/// assert_eq!(lis.try_recv(), Some("ciao"));
/// # Ok(())
/// # }
/// ```
pub struct Builder {
    cfg: ConductorConfig,
    lifecycle: Option<Lifecycle>,
    sink: Option<DeliveryLog>,
}

impl Builder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ConductorConfig) -> Self {
        Self {
            cfg,
            lifecycle: None,
            sink: None,
        }
    }

    /// Binds the conductor to `lifecycle` instead of a fresh background one.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Binds the conductor to the lifecycle of `parent`.
    pub fn with_context(self, parent: &impl Context) -> Self {
        self.with_lifecycle(parent.lifecycle().clone())
    }

    /// Records deliveries into `writer`.
    ///
    /// Takes precedence over [`ConductorConfig::delivery_log`].
    pub fn with_delivery_sink(mut self, writer: impl Write + Send + 'static) -> Self {
        self.sink = Some(DeliveryLog::from_writer(writer));
        self
    }

    /// Builds a [`Simple`] conductor.
    pub fn simple<T: Command>(self) -> Result<Simple<T>, ConductorError> {
        let capacity = self.cfg.listener_capacity_clamped();
        let (lifecycle, log) = self.parts()?;
        Ok(Simple::assemble(lifecycle, log, capacity))
    }

    /// Builds a [`Tagged`] conductor.
    pub fn tagged<T: Command>(self) -> Result<Tagged<T>, ConductorError> {
        let capacity = self.cfg.listener_capacity_clamped();
        let (lifecycle, log) = self.parts()?;
        Ok(Tagged::assemble(lifecycle, log, capacity))
    }

    fn parts(self) -> Result<(Lifecycle, DeliveryLog), ConductorError> {
        let log = match (self.sink, self.cfg.delivery_log.as_deref()) {
            (Some(sink), _) => sink,
            (None, Some(path)) => DeliveryLog::open(path)?,
            (None, None) => DeliveryLog::null(),
        };
        let lifecycle = self.lifecycle.unwrap_or_else(Lifecycle::background);
        Ok((lifecycle, log))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(ConductorConfig::default())
    }
}

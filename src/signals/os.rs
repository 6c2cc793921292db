//! # OS signal sources.
//!
//! ## Signals
//! **Unix platforms:** any set of [`SignalKind`]s via [`Signals::new`];
//! [`Signals::shutdown`] listens for
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **All platforms:** [`CtrlC`] via [`tokio::signal::ctrl_c`].
//!
//! Registering a unix signal replaces its default disposition for the rest of
//! the process, as with any tokio signal listener.

use async_trait::async_trait;

#[cfg(unix)]
pub use tokio::signal::unix::SignalKind;

use super::EventSource;
#[cfg(unix)]
use crate::error::ConductorError;

/// Fires on any of a set of unix signals.
#[cfg(unix)]
pub struct Signals {
    streams: Vec<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl Signals {
    /// Registers interest in every signal of `kinds`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(kinds: impl IntoIterator<Item = SignalKind>) -> Result<Self, ConductorError> {
        let streams = kinds
            .into_iter()
            .map(|kind| tokio::signal::unix::signal(kind).map_err(ConductorError::Signal))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { streams })
    }

    /// `SIGINT`, `SIGTERM` and `SIGQUIT`.
    pub fn shutdown() -> Result<Self, ConductorError> {
        Self::new([
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::quit(),
        ])
    }
}

#[cfg(unix)]
#[async_trait]
impl EventSource for Signals {
    async fn next_event(&mut self) -> Option<()> {
        if self.streams.is_empty() {
            return None;
        }
        let pending = self.streams.iter_mut().map(|s| Box::pin(s.recv()));
        let (received, _, _) = futures::future::select_all(pending).await;
        received
    }
}

/// Fires on every Ctrl-C.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrlC;

#[async_trait]
impl EventSource for CtrlC {
    async fn next_event(&mut self) -> Option<()> {
        tokio::signal::ctrl_c().await.ok()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Simple;

    #[tokio::test]
    async fn empty_signal_set_is_exhausted() {
        let mut none = Signals::new(Vec::<SignalKind>::new()).expect("nothing to register");
        assert_eq!(none.next_event().await, None);
    }

    #[tokio::test]
    async fn sigusr1_is_bridged_into_a_send() {
        let bus = Simple::<&'static str>::new();
        let lis = bus.listen();
        let source = Signals::new([SignalKind::user_defined1()]).expect("register SIGUSR1");
        let _bridge = bus.notify("ciao", source);

        let status = std::process::Command::new("kill")
            .args(["-USR1", &std::process::id().to_string()])
            .status()
            .expect("run kill");
        assert!(status.success());

        let cmd = tokio::time::timeout(Duration::from_millis(500), lis.recv())
            .await
            .expect("signal should be bridged");
        assert_eq!(cmd, Some("ciao"));
    }
}

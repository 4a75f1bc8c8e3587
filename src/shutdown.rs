//! Signal-driven graceful shutdown.
//!
//! One logical task serves HTTP; another blocks on the termination-signal
//! listener. They meet only through the readiness flag and the drain
//! future handed to the server: on the first termination signal the
//! coordinator flips readiness to unavailable, then resolves the drain
//! future, which asks the server to stop accepting connections and let
//! in-flight requests finish. No deadline is imposed on the drain.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ServiceError;
use crate::http::readiness::Readiness;

/// Termination signals the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// Interactive interrupt (SIGINT / ctrl-c).
    Interrupt,
    /// Supervisor-issued terminate (SIGTERM).
    Terminate,
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Coordinator phases, observable for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a termination signal.
    Armed,
    /// A termination signal arrived.
    Triggered,
    /// Readiness is flipped; the server is draining.
    Draining,
    /// The server has finished draining.
    Done,
}

/// Coordinates signal receipt, the readiness flip, and the server drain.
///
/// Cheap to clone; clones observe and drive the same phase cell.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    readiness: Readiness,
    phase: Arc<watch::Sender<Phase>>,
}

impl ShutdownCoordinator {
    /// Arms a coordinator over the given readiness flag.
    #[must_use]
    pub fn new(readiness: Readiness) -> Self {
        let (phase, _) = watch::channel(Phase::Armed);
        Self {
            readiness,
            phase: Arc::new(phase),
        }
    }

    /// Watch handle over the coordinator phase.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// `true` once the drain path has started. Used to classify a server
    /// error as a drain failure rather than a serving failure.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        matches!(*self.phase.borrow(), Phase::Draining | Phase::Done)
    }

    /// Resolves once drain should begin: waits for `signal`, flips
    /// readiness to unavailable, then returns. Hand the returned future to
    /// the server's graceful-shutdown hook.
    ///
    /// Readiness flips before the drain request so load balancers stop
    /// routing new traffic while in-flight requests finish; the flip races
    /// the drain but never blocks on it.
    pub async fn drain_after(&self, signal: impl Future<Output = TermSignal> + Send) {
        let received = signal.await;
        let _ = self.phase.send(Phase::Triggered);
        tracing::info!(signal = %received, "captured termination signal, shutting down");

        self.readiness.mark_unavailable();
        let _ = self.phase.send(Phase::Draining);
        tracing::info!("readiness unavailable, draining server");
    }

    /// Marks the coordinator finished once the server has drained.
    pub fn finish(&self) {
        let _ = self.phase.send(Phase::Done);
    }
}

/// Listener over the process termination signals.
///
/// SIGINT and SIGTERM resolve [`SignalListener::recv`]; SIGHUP and
/// SIGPIPE are installed and explicitly swallowed so neither ends the
/// process.
#[cfg(unix)]
pub struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    pipe: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    /// Installs handlers for the termination set and the ignored set.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Server`] if a handler cannot be installed.
    pub fn install() -> Result<Self, ServiceError> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(ServiceError::Server)?,
            terminate: signal(SignalKind::terminate()).map_err(ServiceError::Server)?,
            hangup: signal(SignalKind::hangup()).map_err(ServiceError::Server)?,
            pipe: signal(SignalKind::pipe()).map_err(ServiceError::Server)?,
        })
    }

    /// Resolves with the first termination signal. Benign signals are
    /// swallowed and never resolve this future.
    pub async fn recv(mut self) -> TermSignal {
        loop {
            tokio::select! {
                _ = self.interrupt.recv() => return TermSignal::Interrupt,
                _ = self.terminate.recv() => return TermSignal::Terminate,
                _ = self.hangup.recv() => {
                    tracing::debug!("ignoring SIGHUP");
                }
                _ = self.pipe.recv() => {
                    tracing::debug!("ignoring SIGPIPE");
                }
            }
        }
    }
}

/// Listener over the process termination signals (ctrl-c only off unix).
#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    /// Installs the ctrl-c handler.
    ///
    /// # Errors
    ///
    /// This fallback cannot fail at install time.
    pub fn install() -> Result<Self, ServiceError> {
        Ok(Self)
    }

    /// Resolves with the first termination signal.
    pub async fn recv(self) -> TermSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => TermSignal::Interrupt,
            Err(error) => {
                tracing::error!(%error, "ctrl-c handler failed");
                std::future::pending().await
            }
        }
    }
}

impl fmt::Debug for SignalListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalListener").finish_non_exhaustive()
    }
}

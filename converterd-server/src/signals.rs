//! Forwards SIGINT and SIGTERM to the shutdown coordinator.
//!
//! Both streams are installed once and kept for the life of the listener,
//! so repeated signals are logged instead of falling through to the default
//! handler.

use converterd_core::ShutdownCoordinator;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub fn spawn_signal_listener(coordinator: ShutdownCoordinator) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interrupt = SignalStream::interrupt();
        let mut terminate = SignalStream::terminate();

        loop {
            let received = tokio::select! {
                _ = interrupt.recv() => interrupt.name,
                _ = terminate.recv() => terminate.name,
            };

            if coordinator.request_shutdown() {
                warn!(signal = received, "Received shutdown signal, waiting for in-flight conversions");
            } else {
                info!(signal = received, "already shutting down");
            }
        }
    })
}

#[cfg(unix)]
struct SignalStream {
    name: &'static str,
    stream: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl SignalStream {
    fn interrupt() -> Self {
        Self::install(tokio::signal::unix::SignalKind::interrupt(), "SIGINT")
    }

    fn terminate() -> Self {
        Self::install(tokio::signal::unix::SignalKind::terminate(), "SIGTERM")
    }

    fn install(kind: tokio::signal::unix::SignalKind, name: &'static str) -> Self {
        let stream = match tokio::signal::unix::signal(kind) {
            Ok(stream) => Some(stream),
            Err(err) => {
                error!(signal = name, error = %err, "failed to install signal handler");
                None
            }
        };
        Self { name, stream }
    }

    /// Resolves on the next delivery; never resolves once the stream is gone.
    async fn recv(&mut self) {
        if let Some(stream) = &mut self.stream
            && stream.recv().await.is_some()
        {
            return;
        }
        self.stream = None;
        std::future::pending::<()>().await
    }
}

#[cfg(not(unix))]
struct SignalStream {
    name: &'static str,
    ctrl_c: bool,
}

#[cfg(not(unix))]
impl SignalStream {
    fn interrupt() -> Self {
        Self {
            name: "SIGINT",
            ctrl_c: true,
        }
    }

    fn terminate() -> Self {
        Self {
            name: "SIGTERM",
            ctrl_c: false,
        }
    }

    async fn recv(&mut self) {
        if self.ctrl_c {
            match tokio::signal::ctrl_c().await {
                Ok(()) => return,
                Err(err) => {
                    error!(signal = self.name, error = %err, "failed to install signal handler");
                    self.ctrl_c = false;
                }
            }
        }
        std::future::pending::<()>().await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    fn raise(signal: &str) {
        let status = std::process::Command::new("kill")
            .args([signal, &std::process::id().to_string()])
            .status()
            .expect("kill runs");
        assert!(status.success());
    }

    #[tokio::test]
    async fn sigterm_requests_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let listener = spawn_signal_listener(coordinator.clone());
        let signal = coordinator.signal();

        // Let the listener install its handlers before raising.
        tokio::time::sleep(Duration::from_millis(100)).await;
        raise("-TERM");

        tokio::time::timeout(Duration::from_secs(5), signal.triggered())
            .await
            .expect("shutdown triggered by SIGTERM");
        assert!(coordinator.is_shutting_down());

        listener.abort();
    }

    #[tokio::test]
    async fn repeated_sigint_keeps_the_listener_alive() {
        let coordinator = ShutdownCoordinator::new();
        let listener = spawn_signal_listener(coordinator.clone());
        let signal = coordinator.signal();

        tokio::time::sleep(Duration::from_millis(100)).await;
        raise("-INT");
        tokio::time::timeout(Duration::from_secs(5), signal.triggered())
            .await
            .expect("shutdown triggered by SIGINT");

        raise("-INT");
        raise("-INT");
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!listener.is_finished(), "listener keeps consuming signals");
        assert!(
            !coordinator.request_shutdown(),
            "shutdown was already requested by the first signal"
        );

        listener.abort();
    }
}

//! Process-wide shutdown coordination.
//!
//! [`ShutdownCoordinator`] owns the one-shot cancellation token and the task
//! tracker that counts launched-but-unfinished conversion jobs. Components
//! that only need to observe shutdown receive a [`ShutdownSignal`], which
//! cannot trigger the transition itself.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Read-only view of the shutdown transition.
#[derive(Clone)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// A signal that is never triggered, for driving components in isolation.
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested. Resolves immediately if it
    /// already has.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}

/// Owns the cancellation token and the outstanding-job barrier.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    requested: Arc<AtomicBool>,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    /// A coordinator in the active state with no outstanding jobs.
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only view for components that observe shutdown.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            token: self.token.clone(),
        }
    }

    /// Transition to the cancelled state.
    ///
    /// Returns `true` for the call that performed the transition and `false`
    /// for every later call, which has no further effect.
    pub fn request_shutdown(&self) -> bool {
        if self.requested.swap(true, Ordering::AcqRel) {
            debug!("shutdown already requested");
            return false;
        }

        info!(
            outstanding_jobs = self.tracker.len(),
            "shutdown requested, cancelling in-flight conversions"
        );
        self.token.cancel();
        true
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Launch a unit of work counted by the outstanding-job barrier.
    ///
    /// Returns `None` without spawning once shutdown has been requested.
    pub fn spawn<F>(&self, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.token.is_cancelled() {
            return None;
        }
        Some(self.tracker.spawn(future))
    }

    /// Number of launched jobs that have not finished yet.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Close the barrier and wait until every tracked job has finished or
    /// been aborted.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("shutting_down", &self.is_shutting_down())
            .field("outstanding", &self.tracker.len())
            .field("closed", &self.tracker.is_closed())
            .finish()
    }
}

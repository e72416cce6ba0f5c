//! The interval-driven poll loop.
//!
//! ```text
//!   Idle --tick--> Scanning --pass done--> Idle
//!     \               |
//!      \--shutdown----+--> Draining --no outstanding jobs--> Terminated
//! ```
//!
//! Shutdown is checked before each watch root and before each discovered
//! file, so a scan in progress stops discovering work as soon as the signal
//! is observed. Jobs already dispatched keep running until they finish or
//! their transcoder is cancelled.

use std::fmt;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::config::{OrchestratorConfig, WatchRoot};
use crate::jobs::JobRunner;
use crate::scan::{ConversionGate, DirectoryWalker};
use crate::shutdown::ShutdownCoordinator;

/// Lifecycle of the poll loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick or for shutdown.
    Idle,
    /// Walking the watch roots and dispatching jobs.
    Scanning,
    /// Shutdown requested; waiting for outstanding jobs.
    Draining,
    /// All outstanding jobs reached a terminal state.
    Terminated,
}

/// Counters for one poll cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Roots whose walk was started.
    pub roots_scanned: usize,
    /// Files yielded by the walker.
    pub files_seen: usize,
    /// Jobs handed to the runner.
    pub jobs_dispatched: usize,
    /// Directories or entries that could not be read.
    pub walk_errors: usize,
    /// Whether shutdown cut the cycle short.
    pub interrupted: bool,
}

/// Drives poll cycles on a fixed interval until shutdown.
pub struct PollScheduler {
    config: OrchestratorConfig,
    walker: DirectoryWalker,
    gate: ConversionGate,
    runner: JobRunner,
    coordinator: ShutdownCoordinator,
    state: watch::Sender<SchedulerState>,
}

impl fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollScheduler")
            .field("config", &self.config)
            .field("runner", &self.runner)
            .field("coordinator", &self.coordinator)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl PollScheduler {
    /// A scheduler in the `Idle` state.
    pub fn new(
        config: OrchestratorConfig,
        runner: JobRunner,
        coordinator: ShutdownCoordinator,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            config,
            walker: DirectoryWalker::new(),
            gate: ConversionGate::new(),
            runner,
            coordinator,
            state,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Run until shutdown, then wait for every outstanding job.
    ///
    /// The first scan happens one full interval after startup.
    pub async fn run(&self) {
        let interval = self.config.poll_interval();
        let shutdown = self.coordinator.signal();
        let roots: Vec<String> = self
            .config
            .watch_roots()
            .iter()
            .map(ToString::to_string)
            .collect();
        info!(?roots, interval_secs = interval.as_secs(), "watching the following folders");

        let mut ticker = interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    warn!("shutdown in progress, stopping ticker");
                    break;
                }
                _ = ticker.tick() => {
                    debug!("checking for new files");
                    let report = self.scan_once().await;
                    if report.interrupted {
                        break;
                    }
                }
            }
        }

        self.drain().await;
    }

    /// One full pass over every watch root, dispatching a job per candidate.
    pub async fn scan_once(&self) -> CycleReport {
        let started = Instant::now();
        let shutdown = self.coordinator.signal();
        let mut report = CycleReport::default();
        if shutdown.is_triggered() {
            report.interrupted = true;
            return report;
        }
        self.set_state(SchedulerState::Scanning);

        for root in self.config.watch_roots() {
            if shutdown.is_triggered() {
                warn!("shutdown in progress, stopping folder checks");
                report.interrupted = true;
                break;
            }

            debug!(root = %root, "checking folder");
            report.roots_scanned += 1;
            if !self.scan_root(root, &mut report).await {
                warn!(root = %root, "shutdown in progress, abandoning folder check");
                report.interrupted = true;
                break;
            }
        }

        if !report.interrupted {
            self.set_state(SchedulerState::Idle);
        }

        debug!(
            roots = report.roots_scanned,
            files = report.files_seen,
            dispatched = report.jobs_dispatched,
            walk_errors = report.walk_errors,
            interrupted = report.interrupted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "poll cycle finished"
        );
        report
    }

    /// Returns `false` when shutdown interrupted the walk.
    async fn scan_root(&self, root: &WatchRoot, report: &mut CycleReport) -> bool {
        let shutdown = self.coordinator.signal();
        let mut entries = self.walker.walk(root.path());

        while let Some(entry) = entries.next().await {
            if shutdown.is_triggered() {
                return false;
            }

            match entry {
                Ok(path) => {
                    report.files_seen += 1;
                    let Some(candidate) = self.gate.candidate(&path).await else {
                        continue;
                    };
                    match self.runner.dispatch(candidate, &self.coordinator) {
                        Some(_) => report.jobs_dispatched += 1,
                        None => return false,
                    }
                }
                Err(err) => {
                    report.walk_errors += 1;
                    error!(root = %root, error = %err, "error reading folder");
                }
            }
        }

        true
    }

    async fn drain(&self) {
        self.set_state(SchedulerState::Draining);
        info!(
            outstanding_jobs = self.coordinator.outstanding(),
            "waiting for in-flight conversions"
        );
        self.coordinator.drain().await;
        self.set_state(SchedulerState::Terminated);
    }

    fn set_state(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "scheduler state changed");
        }
    }
}

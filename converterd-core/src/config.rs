use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{ConverterError, Result};

/// Interval used when none is configured or the configured one is out of
/// range.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted poll interval (365 days).
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A directory tree scanned recursively on every poll cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WatchRoot(PathBuf);

impl WatchRoot {
    /// Wrap a directory path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The directory this root points at.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for WatchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for WatchRoot {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// Validated, read-only settings consumed by the poll scheduler.
///
/// Construction fails when no roots are supplied, so a scheduler can never
/// be started against an empty set.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    watch_roots: Vec<WatchRoot>,
    poll_interval: Duration,
}

impl OrchestratorConfig {
    /// Build a configuration from an ordered list of roots.
    ///
    /// `poll_interval` falls back to [`DEFAULT_POLL_INTERVAL`] when absent,
    /// zero or longer than [`MAX_POLL_INTERVAL`].
    pub fn new<I, P>(watch_roots: I, poll_interval: Option<Duration>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let watch_roots: Vec<WatchRoot> = watch_roots.into_iter().map(WatchRoot::new).collect();

        if watch_roots.is_empty() {
            return Err(ConverterError::NoWatchRoots);
        }

        if let Some(index) = watch_roots
            .iter()
            .position(|root| root.path().as_os_str().is_empty())
        {
            return Err(ConverterError::EmptyWatchRoot { index });
        }

        let poll_interval = match poll_interval {
            Some(interval) if interval > MAX_POLL_INTERVAL => {
                warn!(
                    requested_secs = interval.as_secs(),
                    max_secs = MAX_POLL_INTERVAL.as_secs(),
                    "poll interval too long, using default"
                );
                DEFAULT_POLL_INTERVAL
            }
            Some(interval) if !interval.is_zero() => interval,
            _ => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            watch_roots,
            poll_interval,
        })
    }

    /// Roots in the order they are scanned.
    pub fn watch_roots(&self) -> &[WatchRoot] {
        &self.watch_roots
    }

    /// Time between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

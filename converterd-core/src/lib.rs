//! # converterd core
//!
//! The poll, detect, dispatch and shutdown machinery behind the `converterd`
//! daemon. A set of watch roots is scanned on a fixed interval; every `.flac`
//! file without a sibling `.mp3` becomes a conversion job that runs as its own
//! task until the external transcoder finishes or shutdown cancels it.
//!
//! ## Architecture
//!
//! - [`scan::walker`]: lazy, worklist-based recursive enumeration of a root.
//! - [`scan::gate`]: decides whether a discovered file still needs converting.
//! - [`jobs::transcoder`]: the external transcoder collaborator (ffmpeg).
//! - [`jobs::runner`]: runs one conversion bound to the shutdown signal.
//! - [`shutdown`]: one-shot cancellation plus the outstanding-job barrier.
//! - [`scheduler`]: the interval loop tying the above together.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use converterd_core::{
//!     FfmpegTranscoder, JobRunner, OrchestratorConfig, PollScheduler,
//!     ShutdownCoordinator, TranscodePolicy,
//! };
//!
//! # async fn example() -> converterd_core::Result<()> {
//! let config = OrchestratorConfig::new(["/music"], None)?;
//! let transcoder = FfmpegTranscoder::new("ffmpeg", TranscodePolicy::default());
//! let runner = JobRunner::new(Arc::new(transcoder));
//! let coordinator = ShutdownCoordinator::new();
//!
//! let scheduler = PollScheduler::new(config, runner, coordinator.clone());
//! scheduler.run().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod scan;
pub mod scheduler;
pub mod shutdown;

pub use config::{DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL, OrchestratorConfig, WatchRoot};
pub use error::{ConverterError, Result};
pub use jobs::{
    ConversionJob, DEFAULT_STDERR_DRAIN_TIMEOUT, FfmpegTranscoder, JobOutcome, JobRunner,
    TranscodeError, TranscodePolicy, Transcoder,
};
pub use scan::{
    ConversionGate, DirectoryWalker, FileCandidate, SOURCE_EXTENSION,
    TARGET_EXTENSION, WalkEntry, WalkError,
};
pub use scheduler::{CycleReport, PollScheduler, SchedulerState};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

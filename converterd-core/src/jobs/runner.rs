use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::jobs::transcoder::{TranscodeError, Transcoder};
use crate::scan::FileCandidate;
use crate::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Terminal state of one conversion job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The transcoder reported success.
    Completed,
    /// The transcoder failed. No retry is attempted; the next poll cycle
    /// rediscovers the missing output.
    Failed(TranscodeError),
    /// Shutdown stopped the job before or during the transcode.
    Cancelled,
}

impl JobOutcome {
    /// Whether the transcoder reported success.
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }

    /// Whether shutdown stopped the job.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled)
    }
}

/// One dispatched unit of work.
#[derive(Clone, Debug)]
pub struct ConversionJob {
    id: Uuid,
    candidate: FileCandidate,
}

impl ConversionJob {
    /// Wrap a candidate with a fresh time-ordered id.
    pub fn new(candidate: FileCandidate) -> Self {
        Self {
            id: Uuid::now_v7(),
            candidate,
        }
    }

    /// Identifier used to correlate log lines of this job.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Input and output paths of this job.
    pub fn candidate(&self) -> &FileCandidate {
        &self.candidate
    }
}

/// Launches conversions through a [`Transcoder`] bound to the shutdown signal.
#[derive(Clone)]
pub struct JobRunner {
    transcoder: Arc<dyn Transcoder>,
}

impl fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRunner")
            .field("transcoder", &type_name_of_val(self.transcoder.as_ref()))
            .finish()
    }
}

impl JobRunner {
    /// Runner driving `transcoder`.
    pub fn new(transcoder: Arc<dyn Transcoder>) -> Self {
        Self { transcoder }
    }

    /// Run one job to a terminal outcome.
    ///
    /// A job that observes shutdown before starting refuses to launch the
    /// transcoder at all.
    pub async fn run(&self, job: &ConversionJob, shutdown: &ShutdownSignal) -> JobOutcome {
        let candidate = job.candidate();

        if shutdown.is_triggered() {
            info!(
                job_id = %job.id(),
                input = %candidate.input.display(),
                "shutdown in progress, not starting conversion"
            );
            return JobOutcome::Cancelled;
        }

        let started = Instant::now();
        match self.transcoder.transcode(candidate, shutdown).await {
            Ok(()) => {
                info!(
                    job_id = %job.id(),
                    input = %candidate.input.display(),
                    output = %candidate.output.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "successfully converted file"
                );
                JobOutcome::Completed
            }
            Err(TranscodeError::Cancelled) => {
                warn!(
                    job_id = %job.id(),
                    input = %candidate.input.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "conversion cancelled by shutdown"
                );
                JobOutcome::Cancelled
            }
            Err(err) => {
                error!(
                    job_id = %job.id(),
                    input = %candidate.input.display(),
                    output = %candidate.output.display(),
                    error = %err,
                    "error converting file"
                );
                JobOutcome::Failed(err)
            }
        }
    }

    /// Spawn a job for `candidate` on the coordinator's outstanding-job set.
    ///
    /// Returns `None` when shutdown has already begun.
    pub fn dispatch(
        &self,
        candidate: FileCandidate,
        coordinator: &ShutdownCoordinator,
    ) -> Option<JoinHandle<JobOutcome>> {
        let job = ConversionJob::new(candidate);
        let job_id = job.id();
        let runner = self.clone();
        let shutdown = coordinator.signal();

        let handle = coordinator.spawn(async move { runner.run(&job, &shutdown).await });
        if handle.is_some() {
            info!(job_id = %job_id, outstanding = coordinator.outstanding(), "dispatched conversion");
        }
        handle
    }
}

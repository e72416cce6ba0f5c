use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, info, trace, warn};

use crate::scan::FileCandidate;
use crate::shutdown::ShutdownSignal;

/// Number of trailing stderr lines kept for failure reports.
const STDERR_TAIL_LINES: usize = 10;

/// How long stderr may stay open after the transcoder exits. A process the
/// transcoder left behind can hold the pipe indefinitely.
pub const DEFAULT_STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a transcode did not produce its output.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The transcoder process could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },

    /// The transcoder ran and reported failure.
    #[error("{program} exited with status {code}: {stderr}")]
    ExitStatus {
        /// Program that failed.
        program: String,
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
        /// Last lines the transcoder wrote to stderr.
        stderr: String,
    },

    /// Waiting on the transcoder process failed.
    #[error("failed waiting for {program}: {source}")]
    Wait {
        /// Program being waited on.
        program: String,
        /// Underlying wait failure.
        #[source]
        source: io::Error,
    },

    /// Shutdown terminated the transcoder before it finished.
    #[error("transcode cancelled by shutdown")]
    Cancelled,
}

/// The external collaborator that turns one input file into one output file.
///
/// Implementations must stop promptly once `shutdown` is triggered and
/// report that as [`TranscodeError::Cancelled`] rather than as a failure.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `candidate.input` into `candidate.output`.
    async fn transcode(
        &self,
        candidate: &FileCandidate,
        shutdown: &ShutdownSignal,
    ) -> Result<(), TranscodeError>;
}

/// Fixed target encoding handed to the transcoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodePolicy {
    /// Audio codec passed as `-codec:a`.
    pub codec: String,
    /// Audio bitrate passed as `-b:a`.
    pub bitrate: String,
}

impl Default for TranscodePolicy {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            bitrate: "192k".to_string(),
        }
    }
}

/// Runs `ffmpeg` as a child process per conversion.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    policy: TranscodePolicy,
    stderr_drain_timeout: Duration,
}

impl FfmpegTranscoder {
    /// Use the ffmpeg binary at `ffmpeg_path` (a bare name is resolved via `PATH`).
    pub fn new(ffmpeg_path: impl Into<String>, policy: TranscodePolicy) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            policy,
            stderr_drain_timeout: DEFAULT_STDERR_DRAIN_TIMEOUT,
        }
    }

    /// Override how long to keep reading stderr once the child has exited.
    pub fn with_stderr_drain_timeout(mut self, timeout: Duration) -> Self {
        self.stderr_drain_timeout = timeout;
        self
    }

    /// Configured ffmpeg binary.
    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// Configured target encoding.
    pub fn policy(&self) -> &TranscodePolicy {
        &self.policy
    }

    /// The command line for one conversion. The child is killed if the
    /// returned handle is dropped while it is still running.
    pub fn build_command(&self, candidate: &FileCandidate) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-i")
            .arg(&candidate.input)
            .arg("-codec:a")
            .arg(&self.policy.codec)
            .arg("-b:a")
            .arg(&self.policy.bitrate)
            .arg(&candidate.output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        candidate: &FileCandidate,
        shutdown: &ShutdownSignal,
    ) -> Result<(), TranscodeError> {
        let mut cmd = self.build_command(candidate);
        info!(command = %command_line(&cmd), "running command");

        let mut child = cmd.spawn().map_err(|source| TranscodeError::Launch {
            program: self.ffmpeg_path.clone(),
            source,
        })?;

        // ffmpeg writes progress to stderr; it has to be drained or the
        // child blocks once the pipe fills.
        let stderr_tail = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(collect_stderr_tail(stderr)));

        let status = tokio::select! {
            biased;
            _ = shutdown.triggered() => {
                if let Err(err) = child.kill().await {
                    warn!(
                        input = %candidate.input.display(),
                        error = %err,
                        "failed to terminate transcoder"
                    );
                }
                if let Some(handle) = stderr_tail {
                    handle.abort();
                }
                return Err(TranscodeError::Cancelled);
            }
            status = child.wait() => status.map_err(|source| TranscodeError::Wait {
                program: self.ffmpeg_path.clone(),
                source,
            })?,
        };

        let stderr = match stderr_tail {
            Some(mut handle) => {
                let tail = tokio::select! {
                    biased;
                    _ = shutdown.triggered() => None,
                    tail = &mut handle => Some(tail.unwrap_or_default()),
                    _ = tokio::time::sleep(self.stderr_drain_timeout) => {
                        debug!(
                            input = %candidate.input.display(),
                            "stderr still open after transcoder exited, giving up on it"
                        );
                        None
                    }
                };
                if tail.is_none() {
                    handle.abort();
                }
                tail.unwrap_or_default()
            }
            None => String::new(),
        };

        if status.success() {
            Ok(())
        } else {
            Err(TranscodeError::ExitStatus {
                program: self.ffmpeg_path.clone(),
                code: status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

fn command_line(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn collect_stderr_tail(stderr: ChildStderr) -> String {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stderr).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        trace!(target: "converterd::ffmpeg", "{line}");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Vec::from(tail).join("\n")
}

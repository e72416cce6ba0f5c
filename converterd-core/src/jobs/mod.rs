//! Conversion jobs and the external transcoder they drive.

pub mod runner;
pub mod transcoder;

pub use runner::{ConversionJob, JobOutcome, JobRunner};
pub use transcoder::{
    DEFAULT_STDERR_DRAIN_TIMEOUT, FfmpegTranscoder, TranscodeError, TranscodePolicy, Transcoder,
};

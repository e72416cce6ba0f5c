/// Raw values as read from each source.
pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use converterd_core::{OrchestratorConfig, TranscodePolicy};

/// Fully resolved daemon settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Folders and poll interval.
    pub watch: WatchConfig,
    /// Transcoder binary and target encoding.
    pub ffmpeg: FfmpegConfig,
    /// Log verbosity.
    pub logging: LoggingConfig,
    /// Where the values came from.
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Validated scheduler settings. Fails when no watch folder is
    /// configured.
    pub fn orchestrator(&self) -> converterd_core::Result<OrchestratorConfig> {
        OrchestratorConfig::new(self.watch.folders.iter(), Some(self.watch.poll_interval))
    }

    /// Target encoding for the transcoder.
    pub fn transcode_policy(&self) -> TranscodePolicy {
        TranscodePolicy {
            codec: self.ffmpeg.codec.clone(),
            bitrate: self.ffmpeg.bitrate.clone(),
        }
    }
}

/// What to watch and how often.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Roots in the order they are scanned. May be empty here; emptiness is
    /// rejected by [`Config::orchestrator`].
    pub folders: Vec<PathBuf>,
    /// Time between poll cycles, already range checked.
    pub poll_interval: Duration,
}

/// Transcoder settings.
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    /// Binary to run; a bare name is resolved through `PATH`.
    pub ffmpeg_path: String,
    /// Value for `-codec:a`.
    pub codec: String,
    /// Value for `-b:a`.
    pub bitrate: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        let policy = TranscodePolicy::default();
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            codec: policy.codec,
            bitrate: policy.bitrate,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: LogLevel,
}

/// Verbosity selected through `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Every gate decision and directory visited.
    #[default]
    Debug,
    /// Conversions started and finished.
    Info,
    /// Lifecycle messages and recoverable problems.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Accepts `debug`, `info`, `warn`, `error`, `fatal` and `panic` in any
    /// case. `fatal` and `panic` map to [`LogLevel::Error`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" | "fatal" | "panic" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Provenance of a loaded [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// Whether a `.env` file was applied.
    pub env_file_loaded: bool,
    /// TOML file that was read, if any.
    pub config_path: Option<PathBuf>,
}

use serde::Deserialize;
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    /// `[watch]`
    #[serde(default)]
    pub watch: FileWatchConfig,
    /// `[ffmpeg]`
    #[serde(default)]
    pub ffmpeg: FileFfmpegConfig,
    /// `[logging]`
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

/// The `[watch]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileWatchConfig {
    /// Roots to scan.
    pub folders: Option<Vec<PathBuf>>,
    /// Poll interval in seconds; range checked by the loader.
    pub check_seconds: Option<i64>,
}

/// The `[ffmpeg]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileFfmpegConfig {
    /// Transcoder binary.
    pub ffmpeg_path: Option<String>,
    /// Audio codec.
    pub codec: Option<String>,
    /// Audio bitrate.
    pub bitrate: Option<String>,
}

/// The `[logging]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    /// Level name, parsed by [`crate::LogLevel::parse`].
    pub level: Option<String>,
}

/// Environment-derived configuration values.
///
/// Values are kept raw so the loader can report unparsable input as a
/// warning instead of silently dropping it.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    /// `CONVERTERD_CONFIG`
    pub config_path: Option<PathBuf>,
    /// `WATCH_FOLDERS`, split on commas.
    pub watch_folders: Option<Vec<PathBuf>>,
    /// `CHECK_SECONDS`
    pub check_seconds: Option<String>,
    /// `FFMPEG_PATH`
    pub ffmpeg_path: Option<String>,
    /// `AUDIO_CODEC`
    pub audio_codec: Option<String>,
    /// `AUDIO_BITRATE`
    pub audio_bitrate: Option<String>,
    /// `LOG_LEVEL`
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Read every supported variable from the process environment.
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var("CONVERTERD_CONFIG").ok().map(PathBuf::from),
            watch_folders: parse_csv_var("WATCH_FOLDERS")
                .map(|folders| folders.into_iter().map(PathBuf::from).collect()),
            check_seconds: std::env::var("CHECK_SECONDS").ok(),
            ffmpeg_path: std::env::var("FFMPEG_PATH").ok(),
            audio_codec: std::env::var("AUDIO_CODEC").ok(),
            audio_bitrate: std::env::var("AUDIO_BITRATE").ok(),
            log_level: std::env::var("LOG_LEVEL").ok(),
        }
    }
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| parse_csv(&raw))
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Errors raised while loading configuration.
pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use converterd_core::{DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL};
use tracing::debug;

use self::error::ConfigLoadError;
use crate::{
    models::{
        Config, ConfigMetadata, FfmpegConfig, LogLevel, LoggingConfig, WatchConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["converterd.toml", "config/converterd.toml"];

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// `--watch-folder` values; empty means not given.
    pub watch_folders: Vec<PathBuf>,
    /// `--check-seconds`.
    pub check_seconds: Option<i64>,
}

/// Where to look for configuration and what to override.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// Explicit TOML file; must exist when set.
    pub config_path: Option<PathBuf>,
    /// `.env` file applied before reading the environment.
    pub env_file: Option<PathBuf>,
    /// Command-line values.
    pub overrides: ConfigOverrides,
}

/// Result of a successful load.
#[derive(Debug)]
pub struct ConfigLoad {
    /// The composed configuration.
    pub config: Config,
    /// Problems that did not prevent loading.
    pub warnings: ConfigWarnings,
}

/// Resolves a [`Config`] from CLI overrides, environment, `.env` and TOML.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    /// Loader with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit options.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Read this TOML file instead of the default locations.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Apply this `.env` file instead of `./.env`.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Replace the command-line overrides.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }

    /// Apply the `.env` file, read the process environment and compose.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an already gathered environment, leaving the process
    /// environment untouched.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No converterd.toml detected; falling back to environment variables",
                "Set CONVERTERD_CONFIG or pass --config to use a configuration file",
            );
        }

        let config = self.compose_config(
            file_config.unwrap_or_default(),
            env,
            config_path,
            &mut warnings,
        );
        warnings.extend(validation::check_watch_folders(&config));

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file: FileConfig,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        warnings: &mut ConfigWarnings,
    ) -> Config {
        let FileConfig {
            watch: file_watch,
            ffmpeg: file_ffmpeg,
            logging: file_logging,
        } = file;
        let overrides = &self.options.overrides;

        let folders = if !overrides.watch_folders.is_empty() {
            overrides.watch_folders.clone()
        } else {
            env.watch_folders
                .filter(|folders| !folders.is_empty())
                .or(file_watch.folders)
                .unwrap_or_default()
        };

        let check_seconds = match (overrides.check_seconds, env.check_seconds) {
            (Some(secs), _) => Some(CheckSeconds::Parsed(secs)),
            (None, Some(raw)) => Some(CheckSeconds::Raw(raw)),
            (None, None) => file_watch.check_seconds.map(CheckSeconds::Parsed),
        };
        let poll_interval = resolve_poll_interval(check_seconds, warnings);

        let defaults = FfmpegConfig::default();
        let ffmpeg = FfmpegConfig {
            ffmpeg_path: env
                .ffmpeg_path
                .or(file_ffmpeg.ffmpeg_path)
                .unwrap_or(defaults.ffmpeg_path),
            codec: env
                .audio_codec
                .or(file_ffmpeg.codec)
                .unwrap_or(defaults.codec),
            bitrate: env
                .audio_bitrate
                .or(file_ffmpeg.bitrate)
                .unwrap_or(defaults.bitrate),
        };

        let level = match env.log_level.or(file_logging.level) {
            Some(raw) => LogLevel::parse(&raw).unwrap_or_else(|| {
                warnings.push_with_hint(
                    format!("unknown log level '{raw}', using debug"),
                    "Use one of debug, info, warn, error",
                );
                LogLevel::default()
            }),
            None => LogLevel::default(),
        };

        Config {
            watch: WatchConfig {
                folders,
                poll_interval,
            },
            ffmpeg,
            logging: LoggingConfig { level },
            metadata: ConfigMetadata {
                env_file_loaded: false,
                config_path,
            },
        }
    }
}

enum CheckSeconds {
    Parsed(i64),
    Raw(String),
}

fn resolve_poll_interval(
    check_seconds: Option<CheckSeconds>,
    warnings: &mut ConfigWarnings,
) -> Duration {
    let secs = match check_seconds {
        None => return DEFAULT_POLL_INTERVAL,
        Some(CheckSeconds::Parsed(secs)) => Ok(secs),
        Some(CheckSeconds::Raw(raw)) => raw.trim().parse::<i64>().map_err(|_| raw),
    };

    match secs {
        Ok(secs) if secs > 0 && secs.unsigned_abs() > MAX_POLL_INTERVAL.as_secs() => {
            warnings.push_with_hint(
                format!(
                    "check interval {secs}s is too long; using {}s",
                    DEFAULT_POLL_INTERVAL.as_secs()
                ),
                format!("Use at most {} seconds", MAX_POLL_INTERVAL.as_secs()),
            );
            DEFAULT_POLL_INTERVAL
        }
        Ok(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
        Ok(secs) => {
            warnings.push(format!(
                "check interval must be positive (got {secs}); using {}s",
                DEFAULT_POLL_INTERVAL.as_secs()
            ));
            DEFAULT_POLL_INTERVAL
        }
        Err(raw) => {
            warnings.push(format!(
                "CHECK_SECONDS '{raw}' is not a number; using {}s",
                DEFAULT_POLL_INTERVAL.as_secs()
            ));
            DEFAULT_POLL_INTERVAL
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;

    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

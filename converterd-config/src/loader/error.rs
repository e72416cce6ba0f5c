use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems found while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly named configuration file does not exist.
    #[error("configuration file missing: {path}")]
    MissingConfig {
        /// The path that was asked for.
        path: PathBuf,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying read failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`crate::FileConfig`].
    #[error("failed to parse configuration {path}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Parser diagnostics.
        #[source]
        source: toml::de::Error,
    },
    /// The `.env` file exists but is malformed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

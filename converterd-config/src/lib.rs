//! Configuration loading for converterd.
//!
//! Settings are resolved from, in order of precedence: command-line
//! overrides, the process environment (after an optional `.env` file is
//! applied), a TOML file, and built-in defaults. The result is a [`Config`]
//! plus any non-fatal [`ConfigWarnings`] for the caller to log once tracing
//! is up.

/// Source resolution and composition.
pub mod loader;
/// Composed settings and the raw per-source shapes.
pub mod models;
/// Non-fatal configuration checks.
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigOverrides, error::ConfigLoadError,
};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{Config, ConfigMetadata, FfmpegConfig, LogLevel, LoggingConfig, WatchConfig};
pub use validation::{ConfigWarning, ConfigWarnings};

use std::path::PathBuf;

use clap::Parser;
use converterd_config::{ConfigLoaderOptions, ConfigOverrides};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "converterd")]
#[command(about = "Watches folders and converts new FLAC files to MP3 with ffmpeg")]
pub struct Cli {
    /// Path to a converterd.toml configuration file
    #[arg(long, env = "CONVERTERD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to a .env file applied before reading the environment
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Folder to watch; repeat for several (overrides WATCH_FOLDERS)
    #[arg(long = "watch-folder", value_name = "DIR")]
    pub watch_folders: Vec<PathBuf>,

    /// Seconds between folder checks (overrides CHECK_SECONDS)
    #[arg(long, allow_negative_numbers = true)]
    pub check_seconds: Option<i64>,
}

impl Cli {
    pub fn loader_options(&self) -> ConfigLoaderOptions {
        ConfigLoaderOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
            overrides: ConfigOverrides {
                watch_folders: self.watch_folders.clone(),
                check_seconds: self.check_seconds,
            },
        }
    }
}

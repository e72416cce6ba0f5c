//! # converterd
//!
//! Long-running daemon that polls a set of watch folders and converts every
//! `.flac` file without a sibling `.mp3` using ffmpeg. SIGINT or SIGTERM
//! stop the folder checks, cancel running conversions and wait for them to
//! exit before the process terminates.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use converterd_config::{ConfigLoad, ConfigLoader};
use converterd_core::{
    FfmpegTranscoder, JobRunner, PollScheduler, ShutdownCoordinator,
};
use converterd_server::{
    cli::Cli,
    signals::spawn_signal_listener,
    telemetry::{init_tracing, log_config_warnings},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } = ConfigLoader::with_options(cli.loader_options())
        .load()
        .context("failed to load configuration")?;

    init_tracing(config.logging.level);

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "using configuration file");
    }
    log_config_warnings(&warnings);

    let orchestrator = match config.orchestrator() {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            error!(error = %err, "invalid configuration, refusing to start");
            return Err(err).context("invalid watch folder configuration");
        }
    };

    warn!("Starting the converterd service...");
    info!(
        ffmpeg.path = %config.ffmpeg.ffmpeg_path,
        ffmpeg.codec = %config.ffmpeg.codec,
        ffmpeg.bitrate = %config.ffmpeg.bitrate,
        "transcoder configuration in effect"
    );

    let coordinator = ShutdownCoordinator::new();
    let listener = spawn_signal_listener(coordinator.clone());

    let transcoder =
        FfmpegTranscoder::new(config.ffmpeg.ffmpeg_path.clone(), config.transcode_policy());
    let runner = JobRunner::new(Arc::new(transcoder));
    let scheduler = PollScheduler::new(orchestrator, runner, coordinator);

    scheduler.run().await;

    listener.abort();
    warn!("Shutting down gracefully...");
    Ok(())
}

//! Exercises `FfmpegTranscoder` against small shell scripts standing in for
//! ffmpeg. Tests are serialized so no script is ever executed while another
//! test still holds a freshly written one open.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use converterd_core::{
    FfmpegTranscoder, FileCandidate, ShutdownCoordinator, ShutdownSignal, TranscodeError,
    TranscodePolicy, Transcoder,
};
use tempfile::tempdir;
use tokio::sync::Mutex;

static SERIAL: Mutex<()> = Mutex::const_new(());

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn song(dir: &Path) -> FileCandidate {
    let input = dir.join("song.flac");
    std::fs::write(&input, b"").unwrap();
    FileCandidate::from_source(&input).expect("flac input")
}

fn transcoder(script: &Path) -> FfmpegTranscoder {
    FfmpegTranscoder::new(script.to_string_lossy(), TranscodePolicy::default())
}

#[tokio::test]
async fn success_when_transcoder_exits_zero() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    // Last argument is the output path.
    let script = write_script(tmp.path(), r#"for last; do :; done; : > "$last""#);
    let candidate = song(tmp.path());

    transcoder(&script)
        .transcode(&candidate, &ShutdownSignal::never())
        .await
        .expect("conversion succeeds");

    assert!(candidate.output.exists());
}

#[tokio::test]
async fn failure_reports_exit_code_and_stderr_tail() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "echo 'Input #0, flac' >&2; echo 'song.flac: Invalid data found' >&2; exit 3",
    );
    let candidate = song(tmp.path());

    let err = transcoder(&script)
        .transcode(&candidate, &ShutdownSignal::never())
        .await
        .unwrap_err();

    match err {
        TranscodeError::ExitStatus { code, stderr, .. } => {
            assert_eq!(code, 3);
            assert!(stderr.contains("Invalid data found"), "stderr was {stderr:?}");
        }
        other => panic!("expected exit status error, got {other:?}"),
    }
    assert!(!candidate.output.exists());
}

#[tokio::test]
async fn missing_binary_is_a_launch_error() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    let candidate = song(tmp.path());

    let err = transcoder(&tmp.path().join("no-such-ffmpeg"))
        .transcode(&candidate, &ShutdownSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, TranscodeError::Launch { .. }), "got {err:?}");
}

#[tokio::test]
async fn shutdown_terminates_running_transcoder() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    let script = write_script(tmp.path(), "exec sleep 30");
    let candidate = song(tmp.path());
    let coordinator = ShutdownCoordinator::new();

    let trigger = coordinator.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.request_shutdown();
    });

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        transcoder(&script).transcode(&candidate, &coordinator.signal()),
    )
    .await
    .expect("cancellation does not wait for natural completion");

    assert!(matches!(result, Err(TranscodeError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn leftover_process_holding_stderr_does_not_stall_the_result() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    // The backgrounded sleep inherits stderr and outlives the script.
    let script = write_script(tmp.path(), "sleep 30 & exit 2");
    let candidate = song(tmp.path());

    let started = Instant::now();
    let err = transcoder(&script)
        .with_stderr_drain_timeout(Duration::from_millis(300))
        .transcode(&candidate, &ShutdownSignal::never())
        .await
        .unwrap_err();

    assert!(
        matches!(err, TranscodeError::ExitStatus { code: 2, .. }),
        "got {err:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn shutdown_stops_waiting_on_stderr_after_exit() {
    let _serial = SERIAL.lock().await;
    let tmp = tempdir().unwrap();
    let script = write_script(tmp.path(), "sleep 30 & exit 0");
    let candidate = song(tmp.path());
    let coordinator = ShutdownCoordinator::new();

    let trigger = coordinator.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.request_shutdown();
    });

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        transcoder(&script).transcode(&candidate, &coordinator.signal()),
    )
    .await
    .expect("shutdown is not held up by a leftover stderr writer");

    assert!(result.is_ok(), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use converterd_core::{FileCandidate, ShutdownSignal, TranscodeError, Transcoder};

/// What the fake does when asked to transcode.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Create an empty output file and succeed.
    Convert,
    /// Fail without touching the filesystem.
    Fail,
    /// Run until shutdown, then report cancellation.
    BlockUntilCancelled,
}

pub struct FakeTranscoder {
    behavior: Behavior,
    calls: Mutex<Vec<FileCandidate>>,
    running: AtomicUsize,
    cancelled: AtomicUsize,
}

impl FakeTranscoder {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<FileCandidate> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        candidate: &FileCandidate,
        shutdown: &ShutdownSignal,
    ) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().push(candidate.clone());

        match self.behavior {
            Behavior::Convert => {
                tokio::fs::write(&candidate.output, b"").await.unwrap();
                Ok(())
            }
            Behavior::Fail => Err(TranscodeError::ExitStatus {
                program: "fake-ffmpeg".to_string(),
                code: 1,
                stderr: "unsupported input".to_string(),
            }),
            Behavior::BlockUntilCancelled => {
                self.running.fetch_add(1, Ordering::SeqCst);
                shutdown.triggered().await;
                self.running.fetch_sub(1, Ordering::SeqCst);
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                Err(TranscodeError::Cancelled)
            }
        }
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

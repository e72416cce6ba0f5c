use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Extension of files that are converted.
pub const SOURCE_EXTENSION: &str = "flac";
/// Extension of the converted sibling.
pub const TARGET_EXTENSION: &str = "mp3";

/// A discovered source file paired with the output it should produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileCandidate {
    /// Source media file.
    pub input: PathBuf,
    /// Sibling path the transcoder writes to.
    pub output: PathBuf,
}

impl FileCandidate {
    /// Pair `input` with its expected output, if it has the source extension.
    pub fn from_source(input: &Path) -> Option<Self> {
        if input.extension() != Some(OsStr::new(SOURCE_EXTENSION)) {
            return None;
        }

        Some(Self {
            input: input.to_path_buf(),
            output: input.with_extension(TARGET_EXTENSION),
        })
    }
}

/// Decides whether a discovered file still needs converting.
///
/// The check is a live existence probe with no caching: every call looks at
/// the filesystem as it is right now. It is advisory only. Nothing stops the
/// output from appearing (or a second conversion from being dispatched)
/// between the check and the conversion itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConversionGate;

impl ConversionGate {
    /// Create a gate.
    pub fn new() -> Self {
        Self
    }

    /// `true` iff `path` has the source extension and its target sibling is
    /// missing.
    pub async fn accepts(&self, path: &Path) -> bool {
        self.candidate(path).await.is_some()
    }

    /// Like [`accepts`](Self::accepts), returning the paired candidate.
    pub async fn candidate(&self, path: &Path) -> Option<FileCandidate> {
        let candidate = FileCandidate::from_source(path)?;
        debug!(path = %path.display(), "file is a .{SOURCE_EXTENSION} file");

        match tokio::fs::metadata(&candidate.output).await {
            Ok(_) => {
                debug!(
                    output = %candidate.output.display(),
                    "file already exists with .{TARGET_EXTENSION} extension"
                );
                None
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    output = %candidate.output.display(),
                    "file does not exist with .{TARGET_EXTENSION} extension, converting it"
                );
                Some(candidate)
            }
            Err(err) => {
                warn!(
                    output = %candidate.output.display(),
                    error = %err,
                    "unable to check for converted file, skipping"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn accepts_flac_without_mp3_sibling() {
        let tmp = tempdir().unwrap();
        let song = tmp.path().join("song.flac");
        fs::write(&song, b"").unwrap();

        let candidate = ConversionGate::new().candidate(&song).await.expect("accepted");
        assert_eq!(candidate.input, song);
        assert_eq!(candidate.output, tmp.path().join("song.mp3"));
    }

    #[tokio::test]
    async fn rejects_flac_with_mp3_sibling() {
        let tmp = tempdir().unwrap();
        let song = tmp.path().join("song.flac");
        fs::write(&song, b"").unwrap();
        fs::write(tmp.path().join("song.mp3"), b"").unwrap();

        assert!(!ConversionGate::new().accepts(&song).await);
    }

    #[tokio::test]
    async fn rejects_other_extensions() {
        let tmp = tempdir().unwrap();
        let gate = ConversionGate::new();
        for name in ["song.mp3", "song.wav", "cover.jpg", "song.FLAC", "flac", ".flac"] {
            let path = tmp.path().join(name);
            fs::write(&path, b"").unwrap();
            assert!(!gate.accepts(&path).await, "{name} should be rejected");
        }
    }

    #[test]
    fn only_the_final_extension_is_replaced() {
        let candidate =
            FileCandidate::from_source(Path::new("/music/Live.at.Leeds.flac")).expect("flac");
        assert_eq!(candidate.output, PathBuf::from("/music/Live.at.Leeds.mp3"));
    }

    #[tokio::test]
    async fn repeated_checks_agree_until_filesystem_changes() {
        let tmp = tempdir().unwrap();
        let song = tmp.path().join("song.flac");
        fs::write(&song, b"").unwrap();
        let gate = ConversionGate::new();

        assert!(gate.accepts(&song).await);
        assert!(gate.accepts(&song).await);

        fs::write(tmp.path().join("song.mp3"), b"").unwrap();
        assert!(!gate.accepts(&song).await);
        assert!(!gate.accepts(&song).await);
    }
}

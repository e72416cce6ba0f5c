use std::io;
use std::path::{Path, PathBuf};

use async_stream::stream;
use futures::stream::BoxStream;
use thiserror::Error;
use tracing::{debug, trace};

/// A directory or entry that could not be read during a walk.
#[derive(Error, Debug)]
#[error("failed to read {}: {source}", .path.display())]
pub struct WalkError {
    /// The directory or entry that failed.
    pub path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    pub source: io::Error,
}

/// One item produced by [`DirectoryWalker::walk`].
pub type WalkEntry = Result<PathBuf, WalkError>;

/// Recursive, depth-unbounded file enumeration.
///
/// Traversal keeps an explicit stack of pending directories instead of
/// recursing, so deep trees never grow the call stack. A directory that
/// cannot be read yields a single [`WalkError`] and the walk carries on with
/// whatever is left on the stack.
///
/// Symlinked files are yielded like regular files. Symlinked directories are
/// not descended into.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectoryWalker;

impl DirectoryWalker {
    /// Create a walker.
    pub fn new() -> Self {
        Self
    }

    /// Lazily enumerate every file under `root`. Order is unspecified.
    pub fn walk(&self, root: &Path) -> BoxStream<'static, WalkEntry> {
        let root = root.to_path_buf();

        Box::pin(stream! {
            let mut pending = vec![root];

            while let Some(dir) = pending.pop() {
                let mut entries = match tokio::fs::read_dir(&dir).await {
                    Ok(entries) => entries,
                    Err(source) => {
                        yield Err(WalkError { path: dir, source });
                        continue;
                    }
                };

                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(source) => {
                            yield Err(WalkError { path: dir.clone(), source });
                            break;
                        }
                    };

                    let path = entry.path();
                    let file_type = match entry.file_type().await {
                        Ok(file_type) => file_type,
                        Err(source) => {
                            yield Err(WalkError { path, source });
                            continue;
                        }
                    };

                    if file_type.is_dir() {
                        debug!(path = %path.display(), "found directory");
                        pending.push(path);
                    } else if file_type.is_file() {
                        debug!(path = %path.display(), "found file");
                        yield Ok(path);
                    } else if file_type.is_symlink() {
                        match tokio::fs::metadata(&path).await {
                            Ok(target) if target.is_file() => {
                                debug!(path = %path.display(), "found symlinked file");
                                yield Ok(path);
                            }
                            Ok(_) => {
                                trace!(path = %path.display(), "not following symlinked directory");
                            }
                            Err(source) => {
                                yield Err(WalkError { path, source });
                            }
                        }
                    } else {
                        trace!(path = %path.display(), "skipping special file");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use futures::StreamExt;
    use tempfile::tempdir;

    use super::*;

    async fn collect(root: &Path) -> (BTreeSet<PathBuf>, Vec<WalkError>) {
        let mut files = BTreeSet::new();
        let mut errors = Vec::new();
        let mut entries = DirectoryWalker::new().walk(root);
        while let Some(entry) = entries.next().await {
            match entry {
                Ok(path) => {
                    files.insert(path);
                }
                Err(err) => errors.push(err),
            }
        }
        (files, errors)
    }

    #[tokio::test]
    async fn discovers_deeply_nested_files() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("A").join("B").join("C");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("song.flac"), b"").unwrap();
        fs::write(tmp.path().join("top.flac"), b"").unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let (files, errors) = collect(tmp.path()).await;

        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        let expected: BTreeSet<PathBuf> =
            [nested.join("song.flac"), tmp.path().join("top.flac")].into();
        assert_eq!(files, expected);
    }

    #[tokio::test]
    async fn survives_very_deep_trees() {
        let tmp = tempdir().unwrap();
        let mut dir = tmp.path().to_path_buf();
        for depth in 0..64 {
            dir = dir.join(format!("d{depth}"));
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("deep.flac"), b"").unwrap();

        let (files, errors) = collect(tmp.path()).await;
        assert!(errors.is_empty());
        assert!(files.contains(&dir.join("deep.flac")));
    }

    #[tokio::test]
    async fn missing_root_reports_single_error() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let (files, errors) = collect(&missing).await;

        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, missing);
        assert_eq!(errors[0].source.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn broken_entry_does_not_abort_siblings() {
        let tmp = tempdir().unwrap();
        let sibling = tmp.path().join("album");
        fs::create_dir(&sibling).unwrap();
        fs::write(sibling.join("track.flac"), b"").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling"))
            .unwrap();

        let (files, errors) = collect(tmp.path()).await;

        assert!(files.contains(&sibling.join("track.flac")));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, tmp.path().join("dangling"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn yields_symlinked_files_but_not_symlinked_dirs() {
        let tmp = tempdir().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("song.flac"), b"").unwrap();
        std::os::unix::fs::symlink(real.join("song.flac"), tmp.path().join("link.flac"))
            .unwrap();
        std::os::unix::fs::symlink(&real, tmp.path().join("loop")).unwrap();

        let (files, errors) = collect(tmp.path()).await;

        assert!(errors.is_empty());
        let expected: BTreeSet<PathBuf> =
            [real.join("song.flac"), tmp.path().join("link.flac")].into();
        assert_eq!(files, expected);
    }
}

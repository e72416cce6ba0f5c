use thiserror::Error;

/// Fatal errors raised before the poll loop starts.
///
/// Everything that can go wrong once the loop is running (unreadable
/// directories, transcoder failures) is contained where it happens and only
/// surfaces in the logs.
#[derive(Error, Debug)]
pub enum ConverterError {
    /// No watch roots were configured.
    #[error("no watch folders configured")]
    NoWatchRoots,

    /// A configured watch root was an empty path.
    #[error("watch folder entry {index} is empty")]
    EmptyWatchRoot {
        /// Position of the offending entry in the configured list.
        index: usize,
    },
}

/// Result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, ConverterError>;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading an archive directory
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// I/O error when listing the archive directory
    #[error("I/O error while scanning {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive path exists but is not a directory
    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },
}

/// A single archive that could not be evicted.
///
/// Collected into a [`RetentionReport`](crate::RetentionReport); never aborts
/// the rest of the batch.
#[derive(Debug, Error)]
#[error("failed to delete archive {}: {source}", .path.display())]
pub struct RetentionError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A specialized Result type for archive directory operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

use logroll_archive::RepositoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the rotation manager.
#[derive(Error, Debug)]
pub enum WriterError {
    /// The active file could not be opened, written or closed. The record
    /// passed to the failing call was not durably written.
    #[error("I/O error on active file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manager has been shut down and no longer accepts records
    #[error("rotation manager is closed")]
    Closed,

    /// Invalid path for the active file or archive directory
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Path is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Archive directory could not be read
    #[error("archive directory error: {0}")]
    Repository(#[from] RepositoryError),
}

impl WriterError {
    /// True for failures of the active file itself (permission denied, disk
    /// full, ...), the only class that should make a caller stop producing
    /// records or switch to a fallback sink.
    pub fn is_active_file_failure(&self) -> bool {
        matches!(self, WriterError::Io { .. })
    }
}

/// A rotation that was aborted. The active file stays writable.
#[derive(Error, Debug)]
pub enum RotationError {
    /// Flushing the active file before archiving failed
    #[error("failed to flush active file {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive directory could not be created
    #[error("failed to create archive directory {}: {source}", .path.display())]
    ArchiveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every collision suffix for the archive name is taken
    #[error("no free archive name for {name} in {}", .dir.display())]
    NameExhausted { dir: PathBuf, name: String },

    /// Moving the active file into the archive directory failed
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, WriterError>;

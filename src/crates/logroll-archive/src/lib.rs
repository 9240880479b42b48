//! Archive directory model and retention enforcement
//!
//! This crate knows how rotated log files are named, how to rebuild the set of
//! archives from a directory listing, and how to evict archives that violate a
//! [`RetentionPolicy`].
//!
//! ## Key Components
//!
//! - **ArchiveName**: The `<base>-<token>[-<n>].log` naming contract
//! - **ArchiveEntry**: An archive file with its creation time and size
//! - **RetentionEnforcer**: Deletes the archives that exceed the count or age bound
//!
//! Archive state is never cached: every scan and every enforcement pass re-reads
//! the directory, so files removed by an operator are simply no longer seen.
//!
//! ## Usage
//!
//! ```no_run
//! use logroll_archive::{RetentionEnforcer, RetentionPolicy, scan_archives};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetentionPolicy::default()
//!     .with_max_archive_count(3)
//!     .with_max_archive_age(Duration::from_secs(2 * 24 * 60 * 60));
//!
//! let enforcer = RetentionEnforcer::new("app", policy);
//! let report = enforcer.enforce(Path::new("/var/log/myapp/archive"), chrono::Utc::now());
//! for path in &report.deleted {
//!     println!("evicted {}", path.display());
//! }
//!
//! for entry in scan_archives(Path::new("/var/log/myapp/archive"), "app")? {
//!     println!("{} ({} bytes)", entry.file_name(), entry.size_bytes);
//! }
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod naming;
mod retention;

pub use entry::{ArchiveEntry, scan_archives, stamp_creation_time};
pub use error::{RepositoryError, Result, RetentionError};
pub use naming::{ARCHIVE_EXTENSION, ArchiveName, TokenGranularity};
pub use retention::{RetentionEnforcer, RetentionPolicy, RetentionReport, enforce};

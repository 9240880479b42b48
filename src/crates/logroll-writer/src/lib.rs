//! Plain-text log writer with rotation and retention policies
//!
//! This crate writes log records to a single active file and, when a
//! calendar period ends or the file grows past a size limit, moves it into an
//! archive directory under a timestamped name and starts a new one. After
//! every rotation old archives are pruned by count and age.
//!
//! ## Usage
//!
//! ```no_run
//! use logroll_writer::{
//!     Config, Interval, Level, PathsConfig, RetentionPolicy, RotationManager, RotationPolicy,
//! };
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rotation = RotationPolicy::default()
//!     .with_interval(Interval::Day)
//!     .with_max_size_bytes(100 * 1024 * 1024); // 100 MB per file
//!
//! let retention = RetentionPolicy::default()
//!     .with_max_archive_age(Duration::from_secs(31 * 24 * 60 * 60));
//!
//! let paths = PathsConfig::new("/var/log/myapp/app.log", "/var/log/myapp/archive");
//! let manager = RotationManager::new(Config::new(paths, rotation, retention))?;
//!
//! manager.log(Level::Info, "service started")?;
//!
//! for archive in manager.list_archives()? {
//!     println!("{} ({} bytes)", archive.file_name(), archive.size_bytes);
//! }
//!
//! manager.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod error;
mod log;
mod record;

pub use error::{Result, RotationError, WriterError};
pub use log::{
    ActiveFile, ActiveFileWriter, Archiver, Config, Interval, PathsConfig, Preset, Rotation,
    RotationManager, RotationPolicy, RotationScheduler, RotationTrigger,
};
pub use record::{Level, LogRecord};

pub use logroll_archive::{ArchiveEntry, RetentionError, RetentionPolicy, RetentionReport};
pub use logroll_common::{Clock, ManualClock, SystemClock};

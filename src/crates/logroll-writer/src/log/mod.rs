mod active;
pub use active::{ActiveFile, ActiveFileWriter};

mod archiver;
pub use archiver::Archiver;

mod config;
pub use config::{Config, Interval, PathsConfig, Preset, RotationPolicy};

mod scheduler;
pub use scheduler::{RotationScheduler, RotationTrigger};

use crate::error::RotationError;
use crate::record::{Level, LogRecord};
use crate::{Result, WriterError};
use chrono::{DateTime, Utc};
use logroll_archive::{ArchiveEntry, RetentionEnforcer, RetentionReport, scan_archives};
use logroll_common::{Clock, SystemClock};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, warn};

/// What a due-check did to the active file.
#[derive(Debug)]
pub enum Rotation {
    /// The period ended but the active file was empty; its period was moved
    /// forward instead of producing an empty archive.
    Skipped,
    /// The active file was archived and retention ran afterwards.
    Rotated {
        archive: ArchiveEntry,
        retention: RetentionReport,
    },
    /// The rotation was aborted; the previous file is still active and the
    /// rotation is retried on the next due-check.
    Failed(RotationError),
}

impl Rotation {
    pub fn archive(&self) -> Option<&ArchiveEntry> {
        match self {
            Rotation::Rotated { archive, .. } => Some(archive),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Rotation::Failed(_))
    }
}

struct Inner {
    writer: ActiveFileWriter,
    closed: bool,
}

/// Writes records to an active file, rotating it into an archive directory
/// and pruning old archives.
///
/// All access to the active file goes through one exclusive lock, so
/// records from concurrent producers land in exactly one file each, in lock
/// acquisition order. Retention is serialized by a second lock owned by the
/// [`RetentionEnforcer`].
pub struct RotationManager {
    config: Config,
    clock: Arc<dyn Clock>,
    scheduler: RotationScheduler,
    archiver: Archiver,
    retention: RetentionEnforcer,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for RotationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationManager")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl RotationManager {
    /// Creates a manager using the wall clock.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a manager that reads the time from `clock`.
    ///
    /// The active file is opened (or reused) immediately. The archive
    /// directory is only created by the first rotation.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let archive_dir = &config.paths.archive_dir;
        if archive_dir.exists() && !archive_dir.is_dir() {
            return Err(WriterError::NotADirectory(
                archive_dir.display().to_string(),
            ));
        }

        let base = config.base_name()?.to_string();
        let writer = ActiveFileWriter::open(&config.paths.active_file, clock.now())?;

        info!(
            "active file {} (interval={}, max_size_bytes={:?}), archives in {}",
            config.paths.active_file.display(),
            config.rotation.interval,
            config.rotation.max_size_bytes,
            archive_dir.display(),
        );

        Ok(Self {
            scheduler: RotationScheduler::new(config.rotation),
            archiver: Archiver::new(archive_dir, base.clone(), config.rotation.interval),
            retention: RetentionEnforcer::new(base, config.retention),
            inner: Mutex::new(Inner {
                writer,
                closed: false,
            }),
            config,
            clock,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Writes a record.
    ///
    /// The due-check runs before the append, so a record never lands in a
    /// period that has already ended, and again after it, so a record that
    /// brings the file to the size limit rotates it right away. Returns the
    /// rotations that took place, usually none.
    ///
    /// An error means the record was not written. A failed rotation is not an
    /// error: it is reported in the returned list and the record is written to
    /// the previous file.
    pub fn write(&self, record: &LogRecord) -> Result<Vec<Rotation>> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(WriterError::Closed);
        }

        let mut rotations = Vec::new();
        let now = self.clock.now();

        let before = self.rotate_if_due(&mut inner, now);
        let retry_after = !before.as_ref().is_some_and(Rotation::is_failed);
        rotations.extend(before);

        if !inner.writer.is_open() {
            let path = inner.writer.path().to_path_buf();
            inner
                .writer
                .reopen()
                .map_err(|source| WriterError::Io { path, source })?;
        }

        inner.writer.append(record)?;

        if retry_after {
            rotations.extend(self.rotate_if_due(&mut inner, now));
        }

        Ok(rotations)
    }

    /// Writes a record stamped with the manager's clock.
    pub fn log(&self, level: Level, message: impl Into<String>) -> Result<Vec<Rotation>> {
        self.write(&LogRecord::new(self.clock.now(), level, message))
    }

    /// Runs the due-check without writing. Called periodically so that a
    /// period ending while nothing is written still rotates.
    pub fn tick(&self) -> Option<Rotation> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return None;
        }

        let now = self.clock.now();
        self.rotate_if_due(&mut inner, now)
    }

    /// Rotates immediately regardless of the rotation policy.
    pub fn rotate_now(&self) -> Result<Rotation> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(WriterError::Closed);
        }

        let now = self.clock.now();
        Ok(self.rotate(&mut inner, now, RotationTrigger::Manual))
    }

    /// Runs retention over the archive directory.
    pub fn enforce_retention(&self) -> RetentionReport {
        self.retention
            .enforce(self.archiver.archive_dir(), self.clock.now())
    }

    /// Lists the current archives, oldest first, with size and creation time.
    pub fn list_archives(&self) -> Result<Vec<ArchiveEntry>> {
        Ok(scan_archives(
            self.archiver.archive_dir(),
            self.retention.base(),
        )?)
    }

    /// Snapshot of the active file.
    pub fn active_file(&self) -> ActiveFile {
        self.inner.lock().writer.state().clone()
    }

    pub fn archive_dir(&self) -> &Path {
        self.archiver.archive_dir()
    }

    /// Stops accepting records, then flushes and closes the active file.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;

        let path = inner.writer.path().to_path_buf();
        inner
            .writer
            .close()
            .map_err(|source| WriterError::Io { path, source })?;

        info!("closed active file {}", inner.writer.path().display());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn rotate_if_due(&self, inner: &mut Inner, now: DateTime<Utc>) -> Option<Rotation> {
        let trigger = self.scheduler.due(inner.writer.state(), now)?;
        Some(self.rotate(inner, now, trigger))
    }

    #[instrument(skip(self, inner, now))]
    fn rotate(&self, inner: &mut Inner, now: DateTime<Utc>, trigger: RotationTrigger) -> Rotation {
        if inner.writer.state().size_bytes == 0 {
            debug!("active file is empty, starting a new period instead of archiving");
            inner.writer.restart_period(now);
            return Rotation::Skipped;
        }

        match self.archiver.rotate(&mut inner.writer, now) {
            Ok(archive) => {
                info!(
                    "archived {} ({} bytes)",
                    archive.path.display(),
                    archive.size_bytes
                );
                let retention = self.retention.enforce(self.archiver.archive_dir(), now);
                Rotation::Rotated { archive, retention }
            }
            Err(e) => {
                warn!("rotation aborted, continuing with the current file: {}", e);
                Rotation::Failed(e)
            }
        }
    }

    /// Spawns the periodic due-check on the current tokio runtime.
    ///
    /// The loop only observes `cancellation` between ticks, so a rotation
    /// that has started always completes before the task exits. A zero
    /// `period` is rejected.
    pub fn spawn_ticker(
        self: &Arc<Self>,
        period: Duration,
        cancellation: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        if period.is_zero() {
            return Err(WriterError::Config(
                "rotation check period must be greater than zero".to_string(),
            ));
        }

        let manager = Arc::clone(self);

        Ok(tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancellation.cancelled() => break,
                    _ = interval_timer.tick() => {
                        if let Some(Rotation::Failed(e)) = manager.tick() {
                            debug!("periodic rotation failed: {}", e);
                        }
                    }
                }
            }

            debug!("rotation ticker stopped");
        }))
    }
}

use super::active::ActiveFileWriter;
use super::config::Interval;
use crate::error::RotationError;
use chrono::{DateTime, Utc};
use logroll_archive::{ArchiveEntry, ArchiveName, stamp_creation_time};
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

/// Hands the active file over to the archive directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    archive_dir: PathBuf,
    base: String,
    interval: Interval,
}

impl Archiver {
    pub fn new(archive_dir: impl Into<PathBuf>, base: impl Into<String>, interval: Interval) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            base: base.into(),
            interval,
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Name (without collision suffix) for archiving a file created at
    /// `creation_time` when rotating at `now`.
    ///
    /// With an interval the token names the period the file covers; without
    /// one it is the rotation instant to the second.
    pub fn archive_name(&self, creation_time: DateTime<Utc>, now: DateTime<Utc>) -> ArchiveName {
        let instant = self.interval.period_start(creation_time).unwrap_or(now);
        ArchiveName::new(&self.base, self.interval.token_granularity(), instant)
    }

    /// First free path for `name` in the archive directory.
    fn free_path(&self, name: ArchiveName) -> Result<(PathBuf, ArchiveName), RotationError> {
        let mut sequence = 0u32;
        loop {
            let candidate = name.clone().with_sequence(sequence);
            let path = self.archive_dir.join(candidate.file_name());

            if std::fs::symlink_metadata(&path).is_err() {
                return Ok((path, candidate));
            }

            debug!("archive name {} taken", path.display());
            sequence = sequence
                .checked_add(1)
                .ok_or_else(|| RotationError::NameExhausted {
                    dir: self.archive_dir.clone(),
                    name: name.file_name(),
                })?;
        }
    }

    /// Aborts a rotation, putting the previous file back into append mode.
    fn abort(&self, writer: &mut ActiveFileWriter, err: RotationError) -> RotationError {
        if let Err(e) = writer.reopen() {
            error!(
                "failed to reopen active file {} after aborted rotation: {}",
                writer.path().display(),
                e
            );
        }
        err
    }

    /// Archives the active file and starts a new one.
    ///
    /// 1. flush and close the active handle,
    /// 2. pick `<base>-<token>[-<n>].log`, adding the first free suffix,
    /// 3. rename the closed file into the archive directory,
    /// 4. open a fresh active file at the canonical path.
    ///
    /// The rename is the commit point: before it the old file is still the
    /// active file, after it the archive is complete. Any failure up to and
    /// including the rename reopens the previous file in append mode.
    #[tracing::instrument(skip_all, fields(active = %writer.path().display(), archive))]
    pub fn rotate(
        &self,
        writer: &mut ActiveFileWriter,
        now: DateTime<Utc>,
    ) -> Result<ArchiveEntry, RotationError> {
        let active = writer.state().clone();

        if let Err(source) = writer.close() {
            let err = RotationError::Flush {
                path: active.path.clone(),
                source,
            };
            return Err(self.abort(writer, err));
        }

        if let Err(source) = std::fs::create_dir_all(&self.archive_dir) {
            let err = RotationError::ArchiveDir {
                path: self.archive_dir.clone(),
                source,
            };
            return Err(self.abort(writer, err));
        }

        let (archive_path, name) =
            match self.free_path(self.archive_name(active.creation_time, now)) {
                Ok(found) => found,
                Err(err) => return Err(self.abort(writer, err)),
            };

        if let Err(source) = std::fs::rename(&active.path, &archive_path) {
            let err = RotationError::Move {
                from: active.path.clone(),
                to: archive_path,
                source,
            };
            return Err(self.abort(writer, err));
        }

        tracing::Span::current().record("archive", tracing::field::display(archive_path.display()));

        if let Err(e) = stamp_creation_time(&archive_path, now) {
            warn!(
                "failed to record creation time of {}: {}",
                archive_path.display(),
                e
            );
        }

        if let Err(e) = writer.start_new(now) {
            // The archive is complete; the next write retries the open.
            error!(
                "failed to open new active file {}: {}",
                active.path.display(),
                e
            );
        }

        Ok(
            ArchiveEntry::from_path(&archive_path, &self.base).unwrap_or_else(|| ArchiveEntry {
                path: archive_path,
                creation_time: now,
                name_time: name.timestamp(),
                size_bytes: active.size_bytes,
                sequence: name.sequence(),
            }),
        )
    }
}

use crate::record::LogRecord;
use crate::{Result, WriterError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Snapshot of the file currently receiving records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFile {
    pub path: PathBuf,
    pub creation_time: DateTime<Utc>,
    pub size_bytes: u64,
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Creation time recorded by the file system, falling back to the last
/// modification time where creation times are not tracked.
fn file_creation_time(file: &File) -> std::io::Result<DateTime<Utc>> {
    let metadata = file.metadata()?;
    let created = metadata.created().or_else(|_| metadata.modified())?;
    Ok(DateTime::<Utc>::from(created))
}

/// Owns the open handle of the active file.
///
/// Every record is written with a single `write_all` on an append-mode
/// handle, so the size counter always matches what reached the file.
#[derive(Debug)]
pub struct ActiveFileWriter {
    state: ActiveFile,
    file: Option<File>,
    buf: Vec<u8>,
}

impl ActiveFileWriter {
    /// Opens `path` for appending, creating it (and its parent directory) if
    /// needed.
    ///
    /// A file left behind by a previous run is reused: its size is kept and
    /// its creation time comes from the file system, so a period that ended
    /// while the process was down is rotated on the first check.
    pub fn open(path: &Path, now: DateTime<Utc>) -> Result<Self> {
        let io_err = |source| WriterError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let existed = path.try_exists().map_err(io_err)?;
        let file = open_append(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();

        let creation_time = if existed {
            file_creation_time(&file).unwrap_or(now)
        } else {
            now
        };

        if existed {
            tracing::info!(
                "reusing active file {} ({} bytes, created {})",
                path.display(),
                size_bytes,
                creation_time
            );
        }

        Ok(Self {
            state: ActiveFile {
                path: path.to_path_buf(),
                creation_time,
                size_bytes,
            },
            file: Some(file),
            buf: Vec::with_capacity(256),
        })
    }

    pub fn state(&self) -> &ActiveFile {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Appends one serialized record and returns the number of bytes written.
    ///
    /// On failure the size counter is left untouched and the record must be
    /// considered lost.
    pub fn append(&mut self, record: &LogRecord) -> Result<u64> {
        let Some(file) = self.file.as_mut() else {
            return Err(WriterError::Io {
                path: self.state.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "active file is closed",
                ),
            });
        };

        self.buf.clear();
        record.encode(&mut self.buf);

        file.write_all(&self.buf).map_err(|source| WriterError::Io {
            path: self.state.path.clone(),
            source,
        })?;

        let written = self.buf.len() as u64;
        self.state.size_bytes += written;
        Ok(written)
    }

    /// Flushes file data to disk and releases the handle. Calling this on an
    /// already closed writer does nothing.
    pub fn close(&mut self) -> std::io::Result<()> {
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Reopens the same path in append mode, keeping the creation time so a
    /// pending rotation is retried on the next check.
    pub fn reopen(&mut self) -> std::io::Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = open_append(&self.state.path)?;
        self.state.size_bytes = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Starts a fresh active file at the canonical path after the previous one
    /// has been moved away.
    ///
    /// The snapshot is reset before opening, so when the open fails a later
    /// [`reopen`](Self::reopen) still starts the new file's period at `now`.
    pub fn start_new(&mut self, now: DateTime<Utc>) -> std::io::Result<()> {
        self.file = None;
        self.state.creation_time = now;
        self.state.size_bytes = 0;

        let file = open_append(&self.state.path)?;
        self.state.size_bytes = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Moves the file's period forward without archiving it.
    pub fn restart_period(&mut self, now: DateTime<Utc>) {
        self.state.creation_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap()
    }

    fn record(message: &str) -> LogRecord {
        LogRecord::new(now(), Level::Info, message)
    }

    #[test]
    fn test_open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");

        let writer = ActiveFileWriter::open(&path, now()).unwrap();
        assert!(path.exists());
        assert_eq!(writer.state().size_bytes, 0);
        assert_eq!(writer.state().creation_time, now());
    }

    #[test]
    fn test_append_tracks_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = ActiveFileWriter::open(&path, now()).unwrap();

        let first = writer.append(&record("one")).unwrap();
        let second = writer.append(&record("two")).unwrap();

        assert_eq!(writer.state().size_bytes, first + second);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), first + second);
    }

    #[test]
    fn test_open_reuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"left over\n").unwrap();

        let expected = {
            let file = File::open(&path).unwrap();
            file_creation_time(&file).unwrap()
        };

        let mut writer = ActiveFileWriter::open(&path, now()).unwrap();
        assert_eq!(writer.state().size_bytes, 10);
        assert_eq!(writer.state().creation_time, expected);

        writer.append(&record("more")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("left over\n"));
        assert!(contents.ends_with("more\n"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut writer = ActiveFileWriter::open(&dir.path().join("app.log"), now()).unwrap();

        writer.close().unwrap();
        writer.close().unwrap();
        assert!(!writer.is_open());
    }

    #[test]
    fn test_append_after_close_fails_without_counting() {
        let dir = TempDir::new().unwrap();
        let mut writer = ActiveFileWriter::open(&dir.path().join("app.log"), now()).unwrap();
        writer.close().unwrap();

        let err = writer.append(&record("lost")).unwrap_err();
        assert!(err.is_active_file_failure());
        assert_eq!(writer.state().size_bytes, 0);
    }

    #[test]
    fn test_reopen_keeps_creation_time() {
        let dir = TempDir::new().unwrap();
        let mut writer = ActiveFileWriter::open(&dir.path().join("app.log"), now()).unwrap();
        writer.append(&record("kept")).unwrap();
        let size = writer.state().size_bytes;
        writer.close().unwrap();

        writer.reopen().unwrap();
        assert!(writer.is_open());
        assert_eq!(writer.state().creation_time, now());
        assert_eq!(writer.state().size_bytes, size);
    }
}

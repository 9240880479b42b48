use crate::error::{RepositoryError, Result};
use crate::naming::ArchiveName;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A rotated log file found in the archive directory.
///
/// Built from the directory listing and file metadata on every scan; never
/// treated as authoritative beyond the scan that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    pub path: PathBuf,
    /// When the archive was created, read from the file's modification time
    pub creation_time: DateTime<Utc>,
    /// Instant encoded in the archive's name token
    pub name_time: DateTime<Utc>,
    pub size_bytes: u64,
    /// Collision suffix, 0 when the name carries none
    pub sequence: u32,
}

impl ArchiveEntry {
    /// Builds an entry for `path` if its file name is an archive of `base`
    /// and the file still exists.
    ///
    /// Files whose modification time cannot be read are dated by their name.
    pub fn from_path(path: &Path, base: &str) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let name = ArchiveName::parse(base, file_name)?;

        let metadata = std::fs::symlink_metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        let creation_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| name.timestamp());

        Some(Self {
            path: path.to_path_buf(),
            creation_time,
            name_time: name.timestamp(),
            size_bytes: metadata.len(),
            sequence: name.sequence(),
        })
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Time elapsed since the archive's creation, as seen at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.creation_time)
    }
}

/// Records `instant` as the creation time of the archive at `path`.
///
/// The instant is stored as the file's modification time, which is what
/// [`ArchiveEntry::from_path`] reads back.
pub fn stamp_creation_time(path: &Path, instant: DateTime<Utc>) -> std::io::Result<()> {
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(instant))
}

impl Ord for ArchiveEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name_time
            .cmp(&other.name_time)
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for ArchiveEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lists the archives of `base` in `dir`, oldest first by name token and
/// collision suffix.
///
/// A missing directory yields an empty list. Entries that disappear while
/// the directory is being read are skipped.
pub fn scan_archives(dir: &Path, base: &str) -> Result<Vec<ArchiveEntry>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if dir.exists() && !dir.is_dir() => {
            tracing::debug!("cannot list {}: {}", dir.display(), e);
            return Err(RepositoryError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(RepositoryError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let Ok(path) = dir_entry.map(|e| e.path()) else {
            continue;
        };

        if let Some(entry) = ArchiveEntry::from_path(&path, base) {
            entries.push(entry);
        }
    }

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let entries = scan_archives(&dir.path().join("nope"), "app").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_scan_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "archive", b"");

        let err = scan_archives(&file, "app").unwrap_err();
        assert!(matches!(err, RepositoryError::NotADirectory { .. }));
    }

    #[test]
    fn test_scan_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "app.log", b"active");
        touch(&dir, "README", b"");
        touch(&dir, "other-20261016.log", b"");
        fs::create_dir(dir.path().join("app-20261015.log")).unwrap();
        let archive = touch(&dir, "app-20261016.log", b"hello");

        let entries = scan_archives(dir.path(), "app").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, archive);
        assert_eq!(entries[0].size_bytes, 5);
        assert_eq!(entries[0].name_time, at(16, 0));
    }

    #[test]
    fn test_scan_orders_by_time_then_sequence() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "app-20261016T120000-10.log", b"");
        touch(&dir, "app-20261016T120000-2.log", b"");
        touch(&dir, "app-20261016T120000.log", b"");
        touch(&dir, "app-20261015T235959.log", b"");

        let names: Vec<String> = scan_archives(dir.path(), "app")
            .unwrap()
            .iter()
            .map(|e| e.file_name().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "app-20261015T235959.log",
                "app-20261016T120000.log",
                "app-20261016T120000-2.log",
                "app-20261016T120000-10.log",
            ]
        );
    }

    #[test]
    fn test_creation_time_comes_from_metadata() {
        let dir = TempDir::new().unwrap();
        // A daily archive covering the 14th, archived at midnight on the 15th
        let path = touch(&dir, "app-20261014.log", b"");
        stamp_creation_time(&path, at(15, 0)).unwrap();

        let entry = ArchiveEntry::from_path(&path, "app").unwrap();
        assert_eq!(entry.name_time, at(14, 0));
        assert_eq!(entry.creation_time, at(15, 0));
        assert_eq!(entry.age(at(16, 6)), TimeDelta::hours(30));
    }

    #[test]
    fn test_order_ignores_creation_time() {
        let dir = TempDir::new().unwrap();
        let older = touch(&dir, "app-20261014.log", b"");
        let newer = touch(&dir, "app-20261015.log", b"");
        // Copied back in reverse order
        stamp_creation_time(&older, at(16, 2)).unwrap();
        stamp_creation_time(&newer, at(16, 1)).unwrap();

        let entries = scan_archives(dir.path(), "app").unwrap();
        assert_eq!(entries[0].path, older);
        assert_eq!(entries[1].path, newer);
    }

    #[test]
    fn test_entry_serializes_for_status_display() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "app-20261016T1405.log", b"abc");
        stamp_creation_time(&path, Utc.with_ymd_and_hms(2026, 10, 16, 14, 6, 0).unwrap()).unwrap();
        let entry = ArchiveEntry::from_path(&path, "app").unwrap();

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["sizeBytes"], 3);
        assert_eq!(json["sequence"], 0);
        assert_eq!(json["creationTime"], "2026-10-16T14:06:00Z");
        assert_eq!(json["nameTime"], "2026-10-16T14:05:00Z");
    }
}

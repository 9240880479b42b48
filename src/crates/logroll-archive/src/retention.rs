use crate::entry::{ArchiveEntry, scan_archives};
use crate::error::RetentionError;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[allow(unused_imports)]
use tracing::{debug, error, info, instrument};

/// Controls when archives should be deleted.
///
/// Both bounds are enforced independently: an archive violating either one
/// is evicted. If all fields are `None`, archives are never deleted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetentionPolicy {
    /// Maximum number of archives to keep
    #[serde(default)]
    pub max_archive_count: Option<usize>,
    /// Maximum age of archives to keep
    #[serde(default, with = "humantime_serde")]
    pub max_archive_age: Option<Duration>,
}

impl RetentionPolicy {
    /// Specifies the maximum number of archives.
    pub fn with_max_archive_count(mut self, max_archive_count: usize) -> Self {
        self.max_archive_count = Some(max_archive_count);
        self
    }

    /// Specifies the maximum archive age.
    pub fn with_max_archive_age(mut self, max_archive_age: Duration) -> Self {
        self.max_archive_age = Some(max_archive_age);
        self
    }

    /// Returns true when no bound is configured.
    pub fn is_unbounded(&self) -> bool {
        self.max_archive_count.is_none() && self.max_archive_age.is_none()
    }
}

/// Outcome of one enforcement pass.
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Archives removed by this pass, oldest first
    pub deleted: Vec<PathBuf>,
    /// Archives that should have been removed but could not be
    pub errors: Vec<RetentionError>,
}

impl RetentionReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Why an archive was selected for eviction.
#[derive(Debug, Clone, Copy)]
enum Eviction {
    Age,
    Count,
}

/// Selects the archives to evict from `entries`, which must be sorted oldest first.
fn select_evictions<'a>(
    entries: &'a [ArchiveEntry],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<(&'a ArchiveEntry, Eviction)> {
    let mut marked = vec![None; entries.len()];

    if let Some(max_age) = policy.max_archive_age {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let cutoff = now.checked_sub_signed(max_age).unwrap_or(DateTime::<Utc>::MIN_UTC);

        for (idx, entry) in entries.iter().enumerate() {
            if entry.creation_time < cutoff {
                marked[idx] = Some(Eviction::Age);
            }
        }
    }

    if let Some(max_count) = policy.max_archive_count {
        let remaining = marked.iter().filter(|m| m.is_none()).count();
        let mut surplus = remaining.saturating_sub(max_count);

        for mark in marked.iter_mut() {
            if surplus == 0 {
                break;
            }
            if mark.is_none() {
                *mark = Some(Eviction::Count);
                surplus -= 1;
            }
        }
    }

    entries
        .iter()
        .zip(marked)
        .filter_map(|(entry, mark)| mark.map(|reason| (entry, reason)))
        .collect()
}

/// Deletes the selected archives one by one with `remove`.
///
/// A failure never stops the remaining deletions; an archive that is already
/// gone is skipped silently.
fn delete_selected(
    selected: &[(&ArchiveEntry, Eviction)],
    now: DateTime<Utc>,
    report: &mut RetentionReport,
    remove: impl Fn(&Path) -> std::io::Result<()>,
) {
    for (entry, reason) in selected {
        match reason {
            Eviction::Age => info!(
                "deleting {} (age {}s exceeds max_archive_age)",
                entry.path.display(),
                entry.age(now).num_seconds()
            ),
            Eviction::Count => info!(
                "deleting {} (archive count exceeds max_archive_count)",
                entry.path.display()
            ),
        }

        match remove(entry.path.as_path()) {
            Ok(()) => report.deleted.push(entry.path.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("archive {} already removed", entry.path.display());
            }
            Err(source) => {
                error!("failed to remove archive {:?}: {}", entry.path, source);
                report.errors.push(RetentionError {
                    path: entry.path.clone(),
                    source,
                });
            }
        }
    }
}

/// Deletes the archives of `base` in `archive_dir` that violate `policy`.
///
/// The directory is re-read on every call. Deletion failures are collected in
/// the report and never stop the remaining deletions; an archive that is
/// already gone is skipped silently. Running this twice without a rotation in
/// between deletes nothing the second time.
#[instrument(skip_all, fields(dir = %archive_dir.display(), deleted, failed))]
pub fn enforce(
    archive_dir: &Path,
    base: &str,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> RetentionReport {
    let mut report = RetentionReport::default();

    if policy.is_unbounded() {
        return report;
    }

    let entries = match scan_archives(archive_dir, base) {
        Ok(entries) => entries,
        Err(e) => {
            error!("failed to scan archive directory: {}", e);
            return report;
        }
    };

    delete_selected(
        &select_evictions(&entries, policy, now),
        now,
        &mut report,
        |path| std::fs::remove_file(path),
    );

    let span = tracing::Span::current();
    span.record("deleted", report.deleted.len());
    span.record("failed", report.errors.len());

    report
}

/// Serializes retention passes over one archive directory.
///
/// Holds its own lock, separate from the active-file lock, so two callers
/// never race on deleting the same file.
#[derive(Debug)]
pub struct RetentionEnforcer {
    base: String,
    policy: RetentionPolicy,
    lock: Mutex<()>,
}

impl RetentionEnforcer {
    pub fn new(base: impl Into<String>, policy: RetentionPolicy) -> Self {
        Self {
            base: base.into(),
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Runs one enforcement pass over `archive_dir` as of `now`.
    pub fn enforce(&self, archive_dir: &Path, now: DateTime<Utc>) -> RetentionReport {
        let _guard = self.lock.lock();
        enforce(archive_dir, &self.base, &self.policy, now)
    }
}

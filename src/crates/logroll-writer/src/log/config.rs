use crate::{Result, WriterError};
use logroll_archive::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Calendar period after which the active file is rotated.
///
/// Periods are aligned to UTC: `Day` rotates at UTC midnight, `Hour` and
/// `Minute` at the start of each UTC hour and minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    None,
    Minute,
    Hour,
    Day,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::None => "none",
            Interval::Minute => "minute",
            Interval::Hour => "hour",
            Interval::Day => "day",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Interval::None),
            "minute" => Ok(Interval::Minute),
            "hour" => Ok(Interval::Hour),
            "day" => Ok(Interval::Day),
            other => Err(WriterError::Config(format!(
                "unknown rotation interval '{}', expected one of none|minute|hour|day",
                other
            ))),
        }
    }
}

/// Controls when the active file should be rotated.
///
/// A file rotates when *any* configured limit is reached. With no interval
/// and no size limit, files only rotate when asked to explicitly.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RotationPolicy {
    /// Calendar period of the active file
    #[serde(default)]
    pub interval: Interval,
    /// Maximum active file size
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
}

impl RotationPolicy {
    /// Specifies the rotation period.
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Specifies the maximum active file size.
    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = Some(max_size_bytes);
        self
    }

    /// Returns true when rotation never fires on its own.
    pub fn is_manual_only(&self) -> bool {
        self.interval == Interval::None && self.max_size_bytes.is_none()
    }
}

/// File-system locations used by a rotation manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PathsConfig {
    /// Canonical path of the file receiving new records
    pub active_file: PathBuf,
    /// Directory holding rotated archives
    pub archive_dir: PathBuf,
}

impl PathsConfig {
    pub fn new(active_file: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            active_file: active_file.into(),
            archive_dir: archive_dir.into(),
        }
    }
}

/// Configuration for a rotation manager.
///
/// Built once before the manager is created; the manager never re-reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    /// Policy for when to rotate the active file
    #[serde(default)]
    pub rotation: RotationPolicy,
    /// Policy for when to remove old archives
    #[serde(default)]
    pub retention: RetentionPolicy,
}

impl Config {
    /// Creates a new configuration.
    pub fn new(paths: PathsConfig, rotation: RotationPolicy, retention: RetentionPolicy) -> Self {
        Self {
            paths,
            rotation,
            retention,
        }
    }

    /// Specifies the rotation policy
    pub fn with_rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.rotation = policy;
        self
    }

    /// Specifies the retention policy
    pub fn with_retention_policy(mut self, policy: RetentionPolicy) -> Self {
        self.retention = policy;
        self
    }

    /// Parses a YAML document using the option names `paths.activeFile`,
    /// `rotation.interval`, `retention.maxArchiveAge` and so on.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)
            .map_err(|e| WriterError::Config(format!("failed to parse YAML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WriterError::Config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Checks the invariants the manager relies on.
    pub fn validate(&self) -> Result<()> {
        if self.paths.active_file.as_os_str().is_empty() {
            return Err(WriterError::InvalidPath(
                "active file path cannot be empty".to_string(),
            ));
        }

        if self.paths.archive_dir.as_os_str().is_empty() {
            return Err(WriterError::InvalidPath(
                "archive directory path cannot be empty".to_string(),
            ));
        }

        self.base_name()?;

        if self.rotation.max_size_bytes == Some(0) {
            return Err(WriterError::Config(
                "rotation.maxSizeBytes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Archive base name: the active file's name without its extension.
    pub fn base_name(&self) -> Result<&str> {
        let path = &self.paths.active_file;
        let stem = path.file_stem().ok_or_else(|| {
            WriterError::InvalidPath(format!("{} has no file name", path.display()))
        })?;

        let stem = stem.to_str().ok_or_else(|| {
            WriterError::InvalidPath("active file name contains invalid UTF-8".to_string())
        })?;

        if stem.is_empty() {
            return Err(WriterError::InvalidPath(format!(
                "{} has an empty file name",
                path.display()
            )));
        }

        Ok(stem)
    }
}

/// Ready-made configurations for a log directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Daily rotation, archives kept for 31 days
    Production,
    /// Per-minute rotation, 3 archives kept
    Test,
}

impl Preset {
    pub const ACTIVE_FILE_NAME: &'static str = "app.log";
    pub const ARCHIVE_DIR_NAME: &'static str = "archive";

    /// Resolves the preset to a full configuration rooted at `log_dir`.
    pub fn config(self, log_dir: &Path) -> Config {
        let paths = PathsConfig::new(
            log_dir.join(Self::ACTIVE_FILE_NAME),
            log_dir.join(Self::ARCHIVE_DIR_NAME),
        );

        match self {
            Preset::Production => Config::new(
                paths,
                RotationPolicy::default().with_interval(Interval::Day),
                RetentionPolicy::default()
                    .with_max_archive_age(Duration::from_secs(31 * 24 * 60 * 60)),
            ),
            Preset::Test => Config::new(
                paths,
                RotationPolicy::default().with_interval(Interval::Minute),
                RetentionPolicy::default().with_max_archive_count(3),
            ),
        }
    }
}

impl FromStr for Preset {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Preset::Production),
            "test" => Ok(Preset::Test),
            other => Err(WriterError::Config(format!(
                "unknown preset '{}', expected production or test",
                other
            ))),
        }
    }
}

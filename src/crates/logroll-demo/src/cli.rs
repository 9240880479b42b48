use anyhow::{Context, Result};
use bytesize::ByteSize;
use clap::Parser;
use logroll_writer::{Config, Interval, Preset};
use std::path::PathBuf;
use std::time::Duration;

/// Parse a duration string for clap (e.g., "5m", "2 days", "90s")
fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| {
        format!(
            "Invalid duration format: '{}'. Use formats like '5m', '2 days', '90s'. Error: {}",
            s, e
        )
    })
}

/// Parse a bytesize string for clap (e.g., "100MB", "1.5GB", "512KiB")
fn parse_bytesize(s: &str) -> Result<ByteSize, String> {
    s.parse().map_err(|e| {
        format!(
            "Invalid size format: '{}'. Use formats like '100MB', '1.5GB', '512KiB'. Error: {}",
            s, e
        )
    })
}

#[derive(Debug, Clone, Parser)]
#[command(name = "logroll")]
#[command(about = "Writes sample log records and shows archive rotation and retention.")]
#[command(version)]
pub struct Args {
    /// Preset to start from: production (daily, 31 days kept) or test (per minute, 3 kept)
    #[arg(default_value = "production")]
    pub preset: Preset,

    /// Directory holding app.log and the archive directory
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// YAML configuration file, used instead of the preset
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How long to keep writing records (defaults to 5m for the test preset,
    /// a single batch for production)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Delay between batches of sample records
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub cadence: Duration,

    /// Period of the background rotation check
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub tick: Duration,

    /// Override the rotation interval (none, minute, hour, day)
    #[arg(long)]
    pub interval: Option<Interval>,

    /// Override the maximum active file size (e.g. "10KB")
    #[arg(long, value_parser = parse_bytesize)]
    pub max_size: Option<ByteSize>,

    /// Override the number of archives to keep
    #[arg(long)]
    pub max_count: Option<usize>,

    /// Override the maximum archive age (e.g. "31 days")
    #[arg(long, value_parser = parse_duration)]
    pub max_age: Option<Duration>,

    /// Print the archive status as JSON lines
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Tracing filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl Args {
    /// Resolves the configuration file or preset, then applies overrides.
    pub fn config(&self) -> Result<Config> {
        if self.tick.is_zero() {
            anyhow::bail!("--tick must be greater than zero");
        }
        if self.cadence.is_zero() {
            anyhow::bail!("--cadence must be greater than zero");
        }

        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => self.preset.config(&self.log_dir),
        };

        if let Some(interval) = self.interval {
            config.rotation.interval = interval;
        }
        if let Some(max_size) = self.max_size {
            config.rotation.max_size_bytes = Some(max_size.as_u64());
        }
        if let Some(max_count) = self.max_count {
            config.retention.max_archive_count = Some(max_count);
        }
        if let Some(max_age) = self.max_age {
            config.retention.max_archive_age = Some(max_age);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// How long to keep writing, or `None` for a single batch.
    pub fn run_duration(&self) -> Option<Duration> {
        match (self.duration, self.preset) {
            (Some(duration), _) => Some(duration),
            (None, Preset::Test) => Some(Duration::from_secs(5 * 60)),
            (None, Preset::Production) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_production_preset() {
        let args = Args::parse_from(["logroll"]);
        let config = args.config().unwrap();

        assert_eq!(config.rotation.interval, Interval::Day);
        assert_eq!(config.paths.active_file, PathBuf::from("logs/app.log"));
        assert_eq!(args.run_duration(), None);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "logroll",
            "test",
            "--log-dir",
            "/tmp/demo",
            "--max-size",
            "10KB",
            "--max-age",
            "2days",
            "--interval",
            "hour",
        ]);
        let config = args.config().unwrap();

        assert_eq!(config.rotation.interval, Interval::Hour);
        assert_eq!(config.rotation.max_size_bytes, Some(10_000));
        assert_eq!(config.retention.max_archive_count, Some(3));
        assert_eq!(
            config.retention.max_archive_age,
            Some(Duration::from_secs(2 * 24 * 60 * 60))
        );
        assert_eq!(args.run_duration(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Args::try_parse_from(["logroll", "staging"]).is_err());
        assert!(Args::try_parse_from(["logroll", "--max-size", "lots"]).is_err());
        assert!(Args::try_parse_from(["logroll", "--cadence", "soon"]).is_err());
    }

    #[test]
    fn test_rejects_zero_periods() {
        let args = Args::parse_from(["logroll", "--tick", "0s"]);
        let err = args.config().unwrap_err();
        assert!(err.to_string().contains("--tick"));

        let args = Args::parse_from(["logroll", "test", "--cadence", "0ms"]);
        let err = args.config().unwrap_err();
        assert!(err.to_string().contains("--cadence"));
    }
}

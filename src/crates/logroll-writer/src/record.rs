use crate::WriterError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(WriterError::Config(format!("unknown log level '{}'", other))),
        }
    }
}

/// A single log record.
///
/// Immutable once created. Serialized as one line:
/// `2026-10-16T14:05:09.123Z INFO  message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    timestamp: DateTime<Utc>,
    level: Level,
    message: String,
}

impl LogRecord {
    pub fn new(timestamp: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Appends the serialized record, including the trailing newline, to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.to_string().as_bytes());
        buf.push(b'\n');
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<5} {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_line() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap();
        let record = LogRecord::new(ts, Level::Info, "[1] Info message");

        let mut buf = Vec::new();
        record.encode(&mut buf);
        assert_eq!(buf, b"2026-10-16T14:05:09.000Z INFO  [1] Info message\n");
    }

    #[test]
    fn test_level_padding() {
        assert_eq!(format!("[{:<5}]", Level::Warn), "[WARN ]");
        assert_eq!(format!("[{:<5}]", Level::Error), "[ERROR]");
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("fatal".parse::<Level>().unwrap(), Level::Fatal);
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_order() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Error < Level::Fatal);
    }
}

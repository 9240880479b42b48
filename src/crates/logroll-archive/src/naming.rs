use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// File extension shared by the active file and every archive.
pub const ARCHIVE_EXTENSION: &str = "log";

const DAY_FORMAT: &str = "%Y%m%d";
const MINUTE_FORMAT: &str = "%Y%m%dT%H%M";
const SECOND_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Precision of the timestamp token embedded in an archive name.
///
/// Tokens contain only digits and a `T` separator, so the optional `-<n>`
/// collision suffix can always be told apart from the token itself and a
/// lexical sort of tokens of the same granularity is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenGranularity {
    /// `YYYYMMDD`
    Day,
    /// `YYYYMMDDTHHMM`
    Minute,
    /// `YYYYMMDDTHHMMSS`
    Second,
}

impl TokenGranularity {
    fn format(self) -> &'static str {
        match self {
            TokenGranularity::Day => DAY_FORMAT,
            TokenGranularity::Minute => MINUTE_FORMAT,
            TokenGranularity::Second => SECOND_FORMAT,
        }
    }

    /// Formats `instant` as a token of this granularity.
    pub fn token(self, instant: DateTime<Utc>) -> String {
        instant.format(self.format()).to_string()
    }

    /// Parses a token back into its granularity and the instant it denotes.
    ///
    /// Day tokens denote midnight UTC, minute tokens the start of the minute.
    pub fn parse(token: &str) -> Option<(Self, DateTime<Utc>)> {
        let bytes = token.as_bytes();
        let well_formed = bytes.iter().enumerate().all(|(idx, b)| {
            if idx == 8 {
                *b == b'T'
            } else {
                b.is_ascii_digit()
            }
        });
        if !well_formed {
            return None;
        }

        match bytes.len() {
            8 => {
                let date = NaiveDate::parse_from_str(token, DAY_FORMAT).ok()?;
                let midnight = date.and_hms_opt(0, 0, 0)?;
                Some((TokenGranularity::Day, midnight.and_utc()))
            }
            13 => {
                let padded = format!("{}00", token);
                let instant = NaiveDateTime::parse_from_str(&padded, SECOND_FORMAT).ok()?;
                Some((TokenGranularity::Minute, instant.and_utc()))
            }
            15 => {
                let instant = NaiveDateTime::parse_from_str(token, SECOND_FORMAT).ok()?;
                Some((TokenGranularity::Second, instant.and_utc()))
            }
            _ => None,
        }
    }
}

/// Parsed form of `<base>-<token>[-<n>].log`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveName {
    base: String,
    token: String,
    timestamp: DateTime<Utc>,
    sequence: u32,
}

impl ArchiveName {
    /// Name for an archive of `base` stamped with `instant` at `granularity`.
    pub fn new(base: &str, granularity: TokenGranularity, instant: DateTime<Utc>) -> Self {
        let token = granularity.token(instant);
        // Round-trip through the token so the timestamp is truncated the same
        // way a later directory scan would see it.
        let timestamp = TokenGranularity::parse(&token)
            .map(|(_, ts)| ts)
            .unwrap_or(instant);

        Self {
            base: base.to_string(),
            token,
            timestamp,
            sequence: 0,
        }
    }

    /// Returns the same name with collision suffix `-<sequence>`; 0 means no suffix.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Parses `file_name` as an archive of `base`, returning `None` for
    /// anything that does not follow the naming contract (including the
    /// active file itself).
    pub fn parse(base: &str, file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(ARCHIVE_EXTENSION)?
            .strip_suffix('.')?
            .strip_prefix(base)?
            .strip_prefix('-')?;

        if let Some((_, timestamp)) = TokenGranularity::parse(stem) {
            return Some(Self {
                base: base.to_string(),
                token: stem.to_string(),
                timestamp,
                sequence: 0,
            });
        }

        let (token, suffix) = stem.rsplit_once('-')?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let sequence = suffix.parse::<u32>().ok().filter(|n| *n > 0)?;
        let (_, timestamp) = TokenGranularity::parse(token)?;

        Some(Self {
            base: base.to_string(),
            token: token.to_string(),
            timestamp,
            sequence,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Instant encoded in the token.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sequence == 0 {
            write!(f, "{}-{}.{}", self.base, self.token, ARCHIVE_EXTENSION)
        } else {
            write!(
                f,
                "{}-{}-{}.{}",
                self.base, self.token, self.sequence, ARCHIVE_EXTENSION
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_token_formats() {
        assert_eq!(TokenGranularity::Day.token(instant()), "20261016");
        assert_eq!(TokenGranularity::Minute.token(instant()), "20261016T1405");
        assert_eq!(TokenGranularity::Second.token(instant()), "20261016T140509");
    }

    #[test]
    fn test_token_parse_truncates() {
        let (granularity, ts) = TokenGranularity::parse("20261016").unwrap();
        assert_eq!(granularity, TokenGranularity::Day);
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap());

        let (granularity, ts) = TokenGranularity::parse("20261016T1405").unwrap();
        assert_eq!(granularity, TokenGranularity::Minute);
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap());

        let (granularity, ts) = TokenGranularity::parse("20261016T140509").unwrap();
        assert_eq!(granularity, TokenGranularity::Second);
        assert_eq!(ts, instant());
    }

    #[test]
    fn test_token_parse_rejects_garbage() {
        assert!(TokenGranularity::parse("").is_none());
        assert!(TokenGranularity::parse("2026101").is_none());
        assert!(TokenGranularity::parse("20261332").is_none());
        assert!(TokenGranularity::parse("20261016X1405").is_none());
        assert!(TokenGranularity::parse("20261016T1405-1").is_none());
        assert!(TokenGranularity::parse("2026-10-16").is_none());
    }

    #[test]
    fn test_name_display() {
        let name = ArchiveName::new("app", TokenGranularity::Day, instant());
        assert_eq!(name.file_name(), "app-20261016.log");
        assert_eq!(name.clone().with_sequence(2).file_name(), "app-20261016-2.log");
    }

    #[test]
    fn test_name_timestamp_is_truncated() {
        let name = ArchiveName::new("app", TokenGranularity::Minute, instant());
        assert_eq!(
            name.timestamp(),
            Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_without_suffix() {
        let name = ArchiveName::parse("app", "app-20261016T1405.log").unwrap();
        assert_eq!(name.base(), "app");
        assert_eq!(name.token(), "20261016T1405");
        assert_eq!(name.sequence(), 0);
    }

    #[test]
    fn test_parse_with_suffix() {
        let name = ArchiveName::parse("app", "app-20261016T140509-12.log").unwrap();
        assert_eq!(name.token(), "20261016T140509");
        assert_eq!(name.sequence(), 12);
        assert_eq!(name.timestamp(), instant());
    }

    #[test]
    fn test_parse_base_with_dashes() {
        let name = ArchiveName::parse("my-app", "my-app-20261016-1.log").unwrap();
        assert_eq!(name.base(), "my-app");
        assert_eq!(name.sequence(), 1);

        // A different base that merely shares a prefix is not ours
        assert!(ArchiveName::parse("my", "my-app-20261016-1.log").is_none());
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert!(ArchiveName::parse("app", "app.log").is_none());
        assert!(ArchiveName::parse("app", "app-20261016.txt").is_none());
        assert!(ArchiveName::parse("app", "other-20261016.log").is_none());
        assert!(ArchiveName::parse("app", "app-20261016-0.log").is_none());
        assert!(ArchiveName::parse("app", "app-20261016-+1.log").is_none());
        assert!(ArchiveName::parse("app", "app-20261016-.log").is_none());
        assert!(ArchiveName::parse("app", "app-notatoken.log").is_none());
    }
}

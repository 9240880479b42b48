use super::active::ActiveFile;
use super::config::{Interval, RotationPolicy};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use logroll_archive::TokenGranularity;
use std::fmt;

impl Interval {
    fn period(self) -> Option<TimeDelta> {
        match self {
            Interval::None => None,
            Interval::Minute => Some(TimeDelta::minutes(1)),
            Interval::Hour => Some(TimeDelta::hours(1)),
            Interval::Day => Some(TimeDelta::days(1)),
        }
    }

    /// Start of the UTC period containing `instant`, or `None` without an interval.
    pub fn period_start(self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        instant.duration_trunc(self.period()?).ok()
    }

    /// Granularity of archive name tokens produced under this interval.
    pub fn token_granularity(self) -> TokenGranularity {
        match self {
            Interval::Day => TokenGranularity::Day,
            Interval::Hour | Interval::Minute => TokenGranularity::Minute,
            Interval::None => TokenGranularity::Second,
        }
    }
}

/// Why a rotation fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// The active file's period has ended
    Interval,
    /// The active file reached the size limit
    Size,
    /// Requested explicitly
    Manual,
}

impl fmt::Display for RotationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RotationTrigger::Interval => "interval",
            RotationTrigger::Size => "size",
            RotationTrigger::Manual => "manual",
        })
    }
}

/// Decides whether the active file is due for rotation.
///
/// Holds no state beyond the policy; every decision is a pure function of
/// the active file snapshot and the supplied instant.
#[derive(Debug, Clone, Copy)]
pub struct RotationScheduler {
    policy: RotationPolicy,
}

impl RotationScheduler {
    pub fn new(policy: RotationPolicy) -> Self {
        Self { policy }
    }

    /// Returns the first satisfied trigger, checking the period before the size.
    pub fn due(&self, active: &ActiveFile, now: DateTime<Utc>) -> Option<RotationTrigger> {
        if let (Some(current), Some(created)) = (
            self.policy.interval.period_start(now),
            self.policy.interval.period_start(active.creation_time),
        ) {
            if current > created {
                return Some(RotationTrigger::Interval);
            }
        }

        if self
            .policy
            .max_size_bytes
            .is_some_and(|max| active.size_bytes >= max)
        {
            return Some(RotationTrigger::Size);
        }

        None
    }

    pub fn is_due(&self, active: &ActiveFile, now: DateTime<Utc>) -> bool {
        self.due(active, now).is_some()
    }
}

//! Time utilities for wardend
//!
//! Provides the wall clock used for usage accounting, hour-of-day access
//! windows, and duration parsing/formatting for configuration and logs.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `APPWARDEN_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for testing access windows and the daily reset.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! APPWARDEN_MOCK_TIME="2025-12-25 16:59:30" wardend --rule firefox=10m --allowed-hours 9-17
//! ```

use chrono::{DateTime, Local, Timelike};
#[cfg(debug_assertions)]
use chrono::{NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::WardenError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "APPWARDEN_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format, using real time"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Mock time is ambiguous in the local timezone, using real time"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
pub fn now() -> DateTime<Local> {
    let real_now = Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Whole seconds from `earlier` to `later`.
///
/// A clock that stepped backwards yields zero rather than a negative span.
pub fn seconds_between(earlier: DateTime<Local>, later: DateTime<Local>) -> u64 {
    u64::try_from(later.signed_duration_since(earlier).num_seconds()).unwrap_or(0)
}

/// A daily half-open hour range `[start, end)` in 24-hour local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    start: u8,
    end: u8,
}

impl HourWindow {
    /// Create a window, rejecting `start >= 24`, `end > 24` and `start >= end`.
    pub fn new(start: u8, end: u8) -> Result<Self, WardenError> {
        let value = format!("{}-{}", start, end);
        if start >= 24 {
            return Err(WardenError::hour_window(value, "start hour must be 0-23"));
        }
        if end > 24 {
            return Err(WardenError::hour_window(value, "end hour must be 1-24"));
        }
        if start >= end {
            return Err(WardenError::hour_window(
                value,
                "start hour must be before end hour",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Check an hour of the day against the window.
    ///
    /// Hours outside 0-23 cannot come from a sane clock and are allowed.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if hour >= 24 {
            return true;
        }
        hour >= u32::from(self.start) && hour < u32::from(self.end)
    }

    /// Check whether the given local time falls within the window
    pub fn allows(&self, dt: &DateTime<Local>) -> bool {
        self.contains_hour(dt.hour())
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

impl FromStr for HourWindow {
    type Err = WardenError;

    /// Parse `START-END`, e.g. `9-17`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| WardenError::hour_window(s, "expected START-END, e.g. 9-17"))?;

        let start: u8 = start
            .trim()
            .parse()
            .map_err(|_| WardenError::hour_window(s, "start is not an hour"))?;
        let end: u8 = end
            .trim()
            .parse()
            .map_err(|_| WardenError::hour_window(s, "end is not an hour"))?;

        Self::new(start, end)
    }
}

/// Parse a duration such as `90`, `90s`, `45m`, `2h` or `1h30m`.
///
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, WardenError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(WardenError::duration(s, "empty duration"));
    }

    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c.to_ascii_lowercase() {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            other => {
                return Err(WardenError::duration(s, format!("unknown unit '{}'", other)));
            }
        };
        if digits.is_empty() {
            return Err(WardenError::duration(s, "unit without a number"));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| WardenError::duration(s, "number out of range"))?;
        total = value
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| WardenError::duration(s, "duration overflows"))?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(WardenError::duration(s, "trailing number without a unit"));
    }

    Ok(Duration::from_secs(total))
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

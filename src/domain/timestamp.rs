//! Parsing of the remote service's timestamp format and the trailing window test.
//!
//! Timestamps look like `2024-03-01T12:30:45:123+08:00`: a colon instead of a
//! dot before the milliseconds and an hour-only offset.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use regex::Regex;

use crate::error::FormatError;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Largest accepted window, roughly a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2}):(\d{3})\+(\d{2}):00$")
        .expect("static regex")
});

/// Parse a vendor timestamp into an offset-aware instant.
pub fn parse(time_str: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    let err = || FormatError {
        input: time_str.to_string(),
    };
    let caps = TIME_RE.captures(time_str).ok_or_else(err)?;
    let formatted = format!("{} {}.{}+{}00", &caps[1], &caps[2], &caps[3], &caps[4]);
    DateTime::parse_from_str(&formatted, "%Y-%m-%d %H:%M:%S%.3f%z").map_err(|_| err())
}

/// Trailing window of `days` days ending at "now".
///
/// The lower bound is computed in the offset of the timestamp under test,
/// not the host's local offset.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    days: i64,
    anchor: Option<DateTime<Utc>>,
}

impl Window {
    /// Window ending at the wall clock, re-read on every comparison.
    pub fn trailing(days: i64) -> Self {
        Self { days, anchor: None }
    }

    /// Window ending at a fixed instant.
    pub fn anchored(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            days,
            anchor: Some(now),
        }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    fn now(&self) -> DateTime<Utc> {
        self.anchor.unwrap_or_else(Utc::now)
    }

    /// Lower bound of the window expressed in `offset`; `None` if it is not representable.
    pub fn lower_bound(&self, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        let span = Duration::try_days(self.days)?;
        self.now().with_timezone(offset).checked_sub_signed(span)
    }

    /// Whether `time_str` is strictly after the lower bound. Unparseable input is never recent.
    pub fn contains(&self, time_str: &str) -> bool {
        match parse(time_str) {
            Ok(instant) => match self.lower_bound(instant.offset()) {
                Some(bound) => instant > bound,
                None => {
                    log::warn!("window of {} days is out of range", self.days);
                    false
                }
            },
            Err(e) => {
                log::warn!("time parse error: {e}");
                false
            }
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::trailing(DEFAULT_WINDOW_DAYS)
    }
}

/// Whether `time_str` falls inside the trailing `window_days` window ending now.
pub fn is_recent(time_str: &str, window_days: i64) -> bool {
    Window::trailing(window_days).contains(time_str)
}

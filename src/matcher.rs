use crate::{range::TimeRange, remote::RemoteEntry};
use chrono::naive::NaiveDateTime;
use regex::Regex;

const TIMESTAMP_PATTERN: &str = r"(\d{8})[-_](\d{6})";

/// Selects remote entries whose filename carries a timestamp inside a range.
///
/// The timestamp is the first `YYYYMMDD-HHMMSS` or `YYYYMMDD_HHMMSS` run anywhere in the name.
#[derive(Debug, Clone)]
pub struct TimestampMatcher {
    pattern: Regex,
}

impl Default for TimestampMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampMatcher {
    pub fn new() -> Self {
        // A literal pattern known to compile.
        let pattern = Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is valid");
        TimestampMatcher { pattern }
    }

    /// The embedded timestamp, if the name has one that is a real calendar value.
    ///
    /// `None` without a log message when the shape is absent; `None` with a warning when the
    /// shape is present but the digits are not a valid date and time.
    pub fn timestamp(&self, file_name: &str) -> Option<NaiveDateTime> {
        let caps = self.pattern.captures(file_name)?;
        let digits = format!("{}{}", &caps[1], &caps[2]);

        match NaiveDateTime::parse_from_str(&digits, "%Y%m%d%H%M%S") {
            Ok(dt) => Some(dt),
            Err(err) => {
                log::warn!("Cannot parse timestamp {:?} in {}: {}", &caps[0], file_name, err);
                None
            }
        }
    }

    pub fn is_match(&self, file_name: &str, range: &TimeRange) -> bool {
        match self.timestamp(file_name) {
            Some(dt) => range.contains(dt),
            None => {
                log::debug!("No usable timestamp in {}", file_name);
                false
            }
        }
    }

    pub fn filter(&self, entries: Vec<RemoteEntry>, range: &TimeRange) -> Vec<RemoteEntry> {
        entries
            .into_iter()
            .filter(|entry| self.is_match(&entry.name, range))
            .collect()
    }
}

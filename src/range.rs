use chrono::naive::NaiveDateTime;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// An end before the start is kept as given; such a range contains nothing.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        log::info!("start - {} end - {}", start, end);

        if end < start {
            log::warn!("End before start, nothing can match: start - {} end - {}", start, end);
        }

        TimeRange { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_contains_is_closed() {
        let range = TimeRange::new(at(1, 0, 0, 0), at(1, 23, 59, 59));

        assert!(range.contains(at(1, 0, 0, 0)));
        assert!(range.contains(at(1, 12, 0, 0)));
        assert!(range.contains(at(1, 23, 59, 59)));
        assert!(!range.contains(at(2, 0, 0, 0)));
        assert!(!range.contains(at(1, 0, 0, 0) - chrono::Duration::seconds(1)));
        assert!(!range.is_inverted());
    }

    #[test]
    fn test_single_instant_range() {
        let range = TimeRange::new(at(5, 6, 7, 8), at(5, 6, 7, 8));
        assert!(range.contains(at(5, 6, 7, 8)));
        assert!(!range.contains(at(5, 6, 7, 9)));
    }

    #[test]
    fn test_inverted_range_contains_nothing() {
        let range = TimeRange::new(at(1, 12, 0, 0), at(1, 11, 0, 0));

        assert!(range.is_inverted());
        for instant in &[at(1, 11, 0, 0), at(1, 11, 30, 0), at(1, 12, 0, 0)] {
            assert!(!range.contains(*instant));
        }
    }
}

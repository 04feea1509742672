//! Expansion of loose date and time shorthand into full calendar values.
//!
//! Dates expand to `YYYY-MM-DD` and times to `HH:MM:SS`; the two are joined and parsed with a
//! fixed grammar by [`compose`]. "Now" is always passed in so the rules that depend on the
//! current day or time stay deterministic.
use crate::error::SnapFetchError;
use chrono::{naive::NaiveDateTime, Datelike, Duration};
use strum::IntoStaticStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum Bound {
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "end")]
    End,
}

/// Expand a date shorthand.
///
/// | input        | result                         |
/// |--------------|--------------------------------|
/// | `YYYYMMDD`   | that date                      |
/// | `YYMMDD`     | `20YY-MM-DD`                   |
/// | `MMDD`       | that day of the current year   |
/// | `DD`         | that day of the current month  |
/// | empty        | today                          |
/// | `-n`         | `n` days before today          |
pub fn resolve_date(input: &str, now: NaiveDateTime) -> Result<String, SnapFetchError> {
    let input = input.trim();

    if let Some(days_ago) = negative_offset(input, "date")? {
        let target = now
            .date()
            .checked_sub_signed(Duration::days(i64::from(days_ago)))
            .ok_or_else(|| SnapFetchError::malformed("date", input))?;
        return Ok(target.format(DATE_FORMAT).to_string());
    }

    if !is_all_digits(input) {
        return Err(SnapFetchError::malformed("date", input));
    }

    let today = now.date();
    let expanded = match input.len() {
        8 => format!("{}-{}-{}", &input[..4], &input[4..6], &input[6..]),
        6 => format!("20{}-{}-{}", &input[..2], &input[2..4], &input[4..]),
        4 => format!("{:04}-{}-{}", today.year(), &input[..2], &input[2..]),
        2 => format!("{:04}-{:02}-{}", today.year(), today.month(), input),
        0 => today.format(DATE_FORMAT).to_string(),
        _ => return Err(SnapFetchError::malformed("date", input)),
    };

    Ok(expanded)
}

/// Expand a time shorthand.
///
/// `date` is the already expanded date of the same bound. It only matters for an empty end
/// time, which means "now" when the end date is today and `23:59:59` otherwise.
pub fn resolve_time(
    input: &str,
    bound: Bound,
    date: &str,
    now: NaiveDateTime,
) -> Result<String, SnapFetchError> {
    let input = input.trim();

    if let Some(hours_ago) = negative_offset(input, "time")? {
        let target = now
            .checked_sub_signed(Duration::hours(i64::from(hours_ago)))
            .ok_or_else(|| SnapFetchError::malformed("time", input))?;
        return Ok(target.format(TIME_FORMAT).to_string());
    }

    if !is_all_digits(input) {
        return Err(SnapFetchError::malformed("time", input));
    }

    let expanded = match input.len() {
        6 => format!("{}:{}:{}", &input[..2], &input[2..4], &input[4..]),
        4 => format!("{}:{}:00", &input[..2], &input[2..]),
        2 => format!("{}:00:00", input),
        0 => match bound {
            Bound::Start => "00:00:00".to_owned(),
            Bound::End if date == now.format(DATE_FORMAT).to_string() => {
                now.format(TIME_FORMAT).to_string()
            }
            Bound::End => "23:59:59".to_owned(),
        },
        _ => return Err(SnapFetchError::malformed("time", input)),
    };

    Ok(expanded)
}

/// Join an expanded date and time and parse them as one instant.
pub fn compose(date: &str, time: &str) -> Result<NaiveDateTime, SnapFetchError> {
    let joined = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&joined, DATE_TIME_FORMAT)
        .map_err(|err| SnapFetchError::Parse(format!("invalid date/time {:?}: {}", joined, err)))
}

pub fn resolve_bound(
    date_input: &str,
    time_input: &str,
    bound: Bound,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, SnapFetchError> {
    let date = resolve_date(date_input, now)?;
    let time = resolve_time(time_input, bound, &date, now)?;
    let instant = compose(&date, &time)?;

    let bound_name: &'static str = bound.into();
    log::debug!(
        "Resolved {} ({:?}, {:?}) to {}",
        bound_name,
        date_input,
        time_input,
        instant
    );

    Ok(instant)
}

fn is_all_digits(input: &str) -> bool {
    input.bytes().all(|b| b.is_ascii_digit())
}

// `-n` where n is a non-negative integer. Anything else starting with '-' is malformed.
fn negative_offset(input: &str, kind: &str) -> Result<Option<u32>, SnapFetchError> {
    let digits = match input.strip_prefix('-') {
        Some(digits) => digits,
        None => return Ok(None),
    };

    if digits.is_empty() || !is_all_digits(digits) {
        return Err(SnapFetchError::malformed(kind, input));
    }

    digits
        .parse::<u32>()
        .map(Some)
        .map_err(|_| SnapFetchError::malformed(kind, input))
}

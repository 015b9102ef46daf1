//! UTC timestamp used for UTCTime and GeneralizedTime values

use crate::error::{CodecResult, ErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

// YYYY-MM-DD[( |T)hh:mm[:ss[.fff]]][ ](Z|UTC|GMT|+hh:mm)
static DATE_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?\s*(Z|UTC|GMT|[+-]\d{2}:?\d{2})?$",
    )
    .expect("date pattern is valid")
});

/// Broken-down calendar fields of a [`Timestamp`], always in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl CivilDateTime {
    /// Check the fields describe a real calendar instant
    pub fn validate(&self) -> CodecResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(ErrorKind::InvalidDate(format!("month {} out of range", self.month)));
        }
        let max_day = days_in_month(self.year, self.month);
        if self.day == 0 || self.day > max_day {
            return Err(ErrorKind::InvalidDate(format!(
                "day {} out of range for {:04}-{:02}",
                self.day, self.year, self.month
            )));
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return Err(ErrorKind::InvalidDate(format!(
                "time {:02}:{:02}:{:02} out of range",
                self.hour, self.minute, self.second
            )));
        }
        if self.millisecond > 999 {
            return Err(ErrorKind::InvalidDate(format!(
                "millisecond {} out of range",
                self.millisecond
            )));
        }
        Ok(())
    }
}

/// Instant in time, stored as milliseconds since the Unix epoch (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    millis: i64,
}

impl Timestamp {
    pub fn from_epoch_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn epoch_millis(&self) -> i64 {
        self.millis
    }

    /// Build from calendar fields, validating them first
    pub fn from_civil(civil: CivilDateTime) -> CodecResult<Self> {
        civil.validate()?;
        let days = days_from_civil(civil.year, civil.month, civil.day);
        let seconds = civil.hour as i64 * 3600 + civil.minute as i64 * 60 + civil.second as i64;
        let millis = days
            .checked_mul(MILLIS_PER_DAY)
            .and_then(|m| m.checked_add(seconds * MILLIS_PER_SECOND + civil.millisecond as i64))
            .ok_or_else(|| ErrorKind::InvalidDate(format!("year {} out of range", civil.year)))?;
        Ok(Self { millis })
    }

    pub fn to_civil(&self) -> CivilDateTime {
        let days = self.millis.div_euclid(MILLIS_PER_DAY);
        let in_day = self.millis.rem_euclid(MILLIS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        CivilDateTime {
            year,
            month,
            day,
            hour: (in_day / 3_600_000) as u32,
            minute: (in_day / 60_000 % 60) as u32,
            second: (in_day / 1_000 % 60) as u32,
            millisecond: (in_day % 1_000) as u32,
        }
    }

    /// Shift by a UTC offset given in minutes (local = UTC + offset)
    pub fn from_local(civil: CivilDateTime, offset_minutes: i64) -> CodecResult<Self> {
        let local = Self::from_civil(civil)?;
        Ok(Self {
            millis: local.millis - offset_minutes * 60 * MILLIS_PER_SECOND,
        })
    }

    /// Parse a human-readable date string
    ///
    /// Accepts `YYYY-MM-DD`, optionally followed by ` hh:mm[:ss[.fff]]` or
    /// `Thh:mm[:ss[.fff]]`, optionally followed by `Z`, `UTC`, `GMT` or a
    /// numeric offset such as `+02:00`. A missing zone means UTC.
    pub fn parse(s: &str) -> CodecResult<Self> {
        let trimmed = s.trim();
        let caps = DATE_STRING
            .captures(trimmed)
            .ok_or_else(|| ErrorKind::InvalidDate(format!("cannot parse `{}`", s)))?;

        let number = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };

        let millisecond = caps
            .get(7)
            .map(|m| parse_fraction_millis(m.as_str()))
            .unwrap_or(0);

        let civil = CivilDateTime {
            year: number(1) as i64,
            month: number(2),
            day: number(3),
            hour: number(4),
            minute: number(5),
            second: number(6),
            millisecond,
        };

        let offset = match caps.get(8).map(|m| m.as_str()) {
            None | Some("Z") | Some("UTC") | Some("GMT") => 0,
            Some(zone) => parse_offset_minutes(zone)?,
        };

        Self::from_local(civil, offset)
    }

    /// ISO-8601 rendering, e.g. `2016-10-01T05:00:00Z` or `2016-10-01T05:00:00.250Z`
    pub fn to_iso8601(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Timestamp {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.to_civil();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            c.year, c.month, c.day, c.hour, c.minute, c.second
        )?;
        if c.millisecond != 0 {
            write!(f, ".{:03}", c.millisecond)?;
        }
        write!(f, "Z")
    }
}

/// First three digits of a decimal fraction, as milliseconds ("5" -> 500).
pub fn parse_fraction_millis(digits: &str) -> u32 {
    let mut millis = 0u32;
    for (i, ch) in digits.chars().take(3).enumerate() {
        let digit = ch.to_digit(10).unwrap_or(0);
        millis += digit * 10u32.pow(2 - i as u32);
    }
    millis
}

/// `+hhmm`, `+hh:mm`, `-hhmm` to minutes east of UTC
pub fn parse_offset_minutes(zone: &str) -> CodecResult<i64> {
    let sign = match zone.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(ErrorKind::InvalidDate(format!("invalid zone `{}`", zone))),
    };
    let digits: String = zone[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ErrorKind::InvalidDate(format!("invalid zone `{}`", zone)));
    }
    let hours: i64 = digits[..2].parse().unwrap_or(0);
    let minutes: i64 = digits[2..].parse().unwrap_or(0);
    if hours > 23 || minutes > 59 {
        return Err(ErrorKind::InvalidDate(format!("invalid zone `{}`", zone)));
    }
    Ok(sign * (hours * 60 + minutes))
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

//! UTCTime and GeneralizedTime content codecs

use dermodel_core::datatypes::timestamp::parse_offset_minutes;
use dermodel_core::{CivilDateTime, CodecResult, ErrorKind, Timestamp};
use once_cell::sync::Lazy;
use regex::Regex;

// YYMMDDhhmm[ss](Z|+hhmm|-hhmm)
static UTC_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})?(Z|[+-][0-9]{4})$")
        .expect("UTCTime pattern is valid")
});

// YYYYMMDDhh[mm[ss]][(.|,)f+][Z|+hhmm|-hhmm]
static GENERALIZED_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{4})([0-9]{2})([0-9]{2})([0-9]{2})(?:([0-9]{2})(?:([0-9]{2}))?)?(?:[.,]([0-9]+))?(Z|[+-][0-9]{4})?$",
    )
    .expect("GeneralizedTime pattern is valid")
});

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// `YYMMDDhhmmssZ`; only years 1950 to 2049 are representable
pub fn encode_utc_time(time: &Timestamp) -> CodecResult<Vec<u8>> {
    let c = time.to_civil();
    if !(1950..=2049).contains(&c.year) {
        return Err(ErrorKind::InvalidDate(format!(
            "year {} cannot be represented as UTCTime",
            c.year
        )));
    }
    Ok(format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}Z",
        c.year % 100,
        c.month,
        c.day,
        c.hour,
        c.minute,
        c.second
    )
    .into_bytes())
}

pub fn decode_utc_time(content: &[u8]) -> CodecResult<Timestamp> {
    let text = ascii(content)?;
    let caps = UTC_TIME
        .captures(text)
        .ok_or_else(|| ErrorKind::InvalidDate(format!("`{}` is not a UTCTime", text)))?;
    let field = |i: usize| caps.get(i).map_or(0, |m| m.as_str().parse::<u32>().unwrap_or(0));

    let short_year = field(1) as i64;
    let year = if short_year >= 50 {
        1900 + short_year
    } else {
        2000 + short_year
    };
    let civil = CivilDateTime {
        year,
        month: field(2),
        day: field(3),
        hour: field(4),
        minute: field(5),
        second: field(6),
        millisecond: 0,
    };
    let offset = zone_offset(caps.get(7).map(|m| m.as_str()))?;
    Timestamp::from_local(civil, offset)
}

/// `YYYYMMDDhhmmss[.fff]Z` with trailing fraction zeros dropped
pub fn encode_generalized_time(time: &Timestamp) -> CodecResult<Vec<u8>> {
    let c = time.to_civil();
    if !(0..=9999).contains(&c.year) {
        return Err(ErrorKind::InvalidDate(format!(
            "year {} cannot be represented as GeneralizedTime",
            c.year
        )));
    }
    let mut text = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        c.year, c.month, c.day, c.hour, c.minute, c.second
    );
    if c.millisecond != 0 {
        let fraction = format!("{:03}", c.millisecond);
        text.push('.');
        text.push_str(fraction.trim_end_matches('0'));
    }
    text.push('Z');
    Ok(text.into_bytes())
}

/// Decode GeneralizedTime; a missing zone is read as UTC
///
/// A fraction applies to the last unit present, so `2016100105.5Z` is
/// 05:30:00.
pub fn decode_generalized_time(content: &[u8]) -> CodecResult<Timestamp> {
    let text = ascii(content)?;
    let caps = GENERALIZED_TIME
        .captures(text)
        .ok_or_else(|| ErrorKind::InvalidDate(format!("`{}` is not a GeneralizedTime", text)))?;
    let field = |i: usize| caps.get(i).map_or(0, |m| m.as_str().parse::<u32>().unwrap_or(0));

    let civil = CivilDateTime {
        year: field(1) as i64,
        month: field(2),
        day: field(3),
        hour: field(4),
        minute: field(5),
        second: field(6),
        millisecond: 0,
    };

    let unit = if caps.get(5).is_none() {
        MILLIS_PER_HOUR
    } else if caps.get(6).is_none() {
        MILLIS_PER_MINUTE
    } else {
        MILLIS_PER_SECOND
    };
    let fraction = caps
        .get(7)
        .map_or(0, |m| fraction_of(m.as_str(), unit));

    let offset = zone_offset(caps.get(8).map(|m| m.as_str()))?;
    let base = Timestamp::from_local(civil, offset)?;
    Ok(Timestamp::from_epoch_millis(base.epoch_millis() + fraction))
}

fn ascii(content: &[u8]) -> CodecResult<&str> {
    if content.is_empty() {
        return Err(ErrorKind::InvalidDate("empty time value".to_string()));
    }
    std::str::from_utf8(content)
        .ok()
        .filter(|s| s.is_ascii())
        .ok_or_else(|| ErrorKind::InvalidDate("time value is not ASCII".to_string()))
}

fn zone_offset(zone: Option<&str>) -> CodecResult<i64> {
    match zone {
        None | Some("Z") => Ok(0),
        Some(zone) => parse_offset_minutes(zone),
    }
}

/// Milliseconds represented by a decimal fraction of `unit`, truncated
fn fraction_of(digits: &str, unit: i64) -> i64 {
    let digits = &digits[..digits.len().min(9)];
    let numerator: i64 = digits.parse().unwrap_or(0);
    let denominator = 10i64.pow(digits.len() as u32);
    numerator * unit / denominator
}

//! Timestamps as they appear in GPX `<time>` elements and geocache logs.
//!
//! The accepted form is `YYYY-MM-DDTHH:MM:SS[.fraction](Z|+HH:MM|-HH:MM)?`.
//! Anything whose date or time fields are not integers, or do not name a
//! real calendar instant, yields `None`.

use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};

/// Parse a GPX timestamp into a UTC instant.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let (rest, offset_secs) = split_offset(text.trim())?;

    let (rest, millis) = match rest.find('.') {
        Some(dot) => {
            let digits = rest[dot + 1..].trim();
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let fraction: f64 = format!("0.{digits}").parse().unwrap_or(0.0);
            (&rest[..dot], (fraction * 1000.0).round() as i64)
        }
        None => (rest, 0),
    };

    let (date, time) = rest.split_once('T')?;
    let mut date_fields = date.splitn(3, '-');
    let year: i32 = date_fields.next()?.trim().parse().ok()?;
    let month: u32 = date_fields.next()?.trim().parse().ok()?;
    let day: u32 = date_fields.next()?.trim().parse().ok()?;

    let mut time_fields = time.splitn(3, ':');
    let hour: u32 = time_fields.next()?.trim().parse().ok()?;
    let minute: u32 = time_fields.next()?.trim().parse().ok()?;
    let second: u32 = time_fields.next()?.trim().parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    naive
        .and_utc()
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)?
        .checked_sub_signed(TimeDelta::try_seconds(offset_secs)?)
}

/// Strip a trailing `Z` or numeric UTC offset, returning the offset in
/// seconds east of UTC.
fn split_offset(text: &str) -> Option<(&str, i64)> {
    if let Some(z) = text.find('Z') {
        return Some((&text[..z], 0));
    }
    if let Some(plus) = text.find('+') {
        return Some((&text[..plus], parse_offset(&text[plus + 1..])?));
    }
    if let Some(t) = text.find('T') {
        if let Some(minus) = text[t..].find('-') {
            let at = t + minus;
            return Some((&text[..at], -parse_offset(&text[at + 1..])?));
        }
    }
    Some((text, 0))
}

fn parse_offset(text: &str) -> Option<i64> {
    let (hours, minutes) = match text.split_once(':') {
        Some((h, m)) => (h, m),
        None => (text, "0"),
    };
    let hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;
    if !(0..=24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

/// Format an instant the way GPX output carries it. Milliseconds are only
/// written when non-zero.
pub fn format_time(time: &DateTime<Utc>) -> String {
    if time.nanosecond() / 1_000_000 == 0 {
        time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_zulu() {
        let t = parse_time("2020-01-02T03:04:05Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(t.timestamp_subsec_millis(), 0);
    }

    #[test]
    fn test_fraction_and_positive_offset() {
        let t = parse_time("2020-01-02T03:04:05.5+02:00").unwrap();
        let expected =
            Utc.with_ymd_and_hms(2020, 1, 2, 1, 4, 5).unwrap() + TimeDelta::milliseconds(500);
        assert_eq!(t, expected);
        assert_eq!(t.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_negative_offset_shifts_later() {
        let t = parse_time("2020-01-02T22:30:00-05:30").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2020, 1, 3, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_no_zone_is_utc() {
        let t = parse_time("2019-12-31T23:59:59").unwrap();
        assert_eq!(t.year(), 2019);
        assert_eq!(t, Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_fraction_rounds_to_millis() {
        let t = parse_time("2020-01-02T03:04:05.12345Z").unwrap();
        assert_eq!(t.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_time("not-a-date"), None);
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("2020-13-02T03:04:05Z"), None);
        assert_eq!(parse_time("2020-01-02Tab:04:05Z"), None);
    }

    #[test]
    fn test_out_of_range_offset() {
        assert_eq!(parse_time("2020-01-02T03:04:05+9999999999999:00"), None);
        assert_eq!(parse_time("2020-01-02T03:04:05+25:00"), None);
        assert_eq!(parse_time("2020-01-02T03:04:05-02:75"), None);
    }

    #[test]
    fn test_non_digit_fraction() {
        assert_eq!(parse_time("2020-01-02T03:04:05.9e300Z"), None);
        assert_eq!(parse_time("2020-01-02T03:04:05.-5Z"), None);
    }

    #[test]
    fn test_fraction_rounding_up_carries_into_seconds() {
        let t = parse_time("2020-01-02T03:04:05.9999Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 6).unwrap());
    }

    #[test]
    fn test_extreme_year_does_not_overflow() {
        assert_eq!(parse_time("262142-12-31T23:59:59-24:00"), None);
    }

    #[test]
    fn test_format() {
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_time(&t), "2020-01-02T03:04:05Z");
        let t = t + TimeDelta::milliseconds(250);
        assert_eq!(format_time(&t), "2020-01-02T03:04:05.250Z");
    }
}

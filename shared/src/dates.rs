//! Lenient timestamp handling for server-provided date strings.
//!
//! The content API is not consistent about formats: some fields are full
//! RFC 3339 timestamps, some are SQL-style `YYYY-MM-DD HH:MM:SS` in the
//! school's local time, and some are bare dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a time zone name, defaulting to UTC for anything unknown.
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or(chrono_tz::UTC)
}

/// Parse a timestamp string. Values without an offset are local to `tz`;
/// bare dates are midnight of that day.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Calendar date of a date-ish string as seen in `tz`.
///
/// Timestamps with an offset are converted to the board's zone first, so
/// `2024-01-02T16:00:00Z` is January 3rd in Manila. Naive values and bare
/// dates already are local and keep their leading `YYYY-MM-DD`.
pub fn calendar_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz).date_naive());
    }
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// "Today" in the board's time zone for the given instant.
pub fn today_in_tz(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2024-01-15T12:30:00Z", chrono_tz::UTC).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap());

        let dt = parse_timestamp("2024-01-15T12:30:00+02:00", chrono_tz::UTC).unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_sql_datetime_in_board_timezone() {
        // Berlin is UTC+1 in January
        let dt = parse_timestamp("2024-01-15 12:30:00", chrono_tz::Europe::Berlin).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_timestamp("2024-01-15T12:30:00.250", chrono_tz::UTC).unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let dt = parse_timestamp("2024-01-03", chrono_tz::UTC).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("", chrono_tz::UTC).is_none());
        assert!(parse_timestamp("   ", chrono_tz::UTC).is_none());
        assert!(parse_timestamp("next tuesday", chrono_tz::UTC).is_none());
        assert!(parse_timestamp("2024-13-45", chrono_tz::UTC).is_none());
    }

    #[test]
    fn test_calendar_date_of_local_values() {
        let tz = chrono_tz::Asia::Manila;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(calendar_date("2024-03-01", tz), Some(expected));
        assert_eq!(calendar_date("2024-03-01 23:59:59", tz), Some(expected));
        assert_eq!(calendar_date("2024-03-01T23:59:59", tz), Some(expected));
        assert_eq!(calendar_date("03/01/2024", tz), None);
        assert_eq!(calendar_date("2024", tz), None);
    }

    #[test]
    fn test_calendar_date_converts_offset_timestamps_to_board_zone() {
        // Local midnight of Jan 3rd in Manila, sent as a UTC instant
        let raw = "2024-01-02T16:00:00.000Z";
        assert_eq!(
            calendar_date(raw, chrono_tz::Asia::Manila),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(calendar_date(raw, chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(
            calendar_date("2024-03-01T23:30:00-05:00", chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn test_invalid_timezone_defaults_to_utc() {
        assert_eq!(parse_timezone("Invalid/Timezone"), chrono_tz::UTC);
        assert_eq!(parse_timezone("Asia/Manila"), chrono_tz::Asia::Manila);
    }

    #[test]
    fn test_today_in_tz() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        assert_eq!(
            today_in_tz(now, chrono_tz::Asia::Tokyo),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
        assert_eq!(
            today_in_tz(now, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}

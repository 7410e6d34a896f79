use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use shared::DateTimeInput;

/// Events without an explicit end run for one hour.
pub const DEFAULT_EVENT_DURATION_SECS: i64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unrecognized date/time string: {0}")]
    UnrecognizedString(String),
    #[error("Timestamp out of range")]
    OutOfRange,
    #[error("Local time does not exist or is ambiguous in this timezone: {0}")]
    InvalidLocalTime(String),
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

pub fn parse_timezone(label: &str) -> Result<Tz, ParseError> {
    label
        .parse()
        .map_err(|_| ParseError::UnknownTimezone(label.to_string()))
}

/// Normalize one of the accepted input shapes to a UTC instant.
///
/// Naive strings and split date/time parts are interpreted in `tz`;
/// offset-carrying strings and the legacy epoch wrapper already pin the
/// instant.
pub fn parse_input(input: &DateTimeInput, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    match input {
        DateTimeInput::Iso(raw) => parse_string(raw, tz),
        DateTimeInput::LegacyTimestamp {
            seconds,
            nanoseconds,
        } => Utc
            .timestamp_opt(*seconds, *nanoseconds)
            .single()
            .ok_or(ParseError::OutOfRange),
        DateTimeInput::Parts { date, time } => {
            let time = (*time).unwrap_or(NaiveTime::MIN);
            local_to_utc(date.and_time(time), tz)
        }
    }
}

/// Resolve a start/end input pair: the end defaults to start plus
/// [`DEFAULT_EVENT_DURATION_SECS`] when absent.
pub fn resolve_range(
    start: &DateTimeInput,
    end: Option<&DateTimeInput>,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ParseError> {
    let start = parse_input(start, tz)?;
    let end = match end {
        Some(input) => parse_input(input, tz)?,
        None => start + Duration::seconds(DEFAULT_EVENT_DURATION_SECS),
    };
    Ok((start, end))
}

fn parse_string(raw: &str, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive date-time without offset, as date pickers produce.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return local_to_utc(naive, tz);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return local_to_utc(naive, tz);
    }
    // Bare date means local midnight.
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return local_to_utc(date.and_time(NaiveTime::MIN), tz);
    }
    Err(ParseError::UnrecognizedString(raw.to_string()))
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    tz.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ParseError::InvalidLocalTime(naive.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_rfc3339_string() {
        let input = DateTimeInput::Iso("2026-03-01T09:00:00Z".to_string());
        let parsed = parse_input(&input, chrono_tz::UTC).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T09:00:00+00:00");
    }

    #[test]
    fn test_parse_naive_string_uses_timezone() {
        let input = DateTimeInput::Iso("2026-03-01T09:00:00".to_string());
        let parsed = parse_input(&input, chrono_tz::Europe::Berlin).unwrap();
        // Berlin is UTC+1 in March (before DST).
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_parse_bare_date_is_local_midnight() {
        let input = DateTimeInput::Iso("2026-03-01".to_string());
        let parsed = parse_input(&input, chrono_tz::UTC).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_legacy_timestamp() {
        let input = DateTimeInput::LegacyTimestamp {
            seconds: 1_700_000_000,
            nanoseconds: 0,
        };
        let parsed = parse_input(&input, chrono_tz::UTC).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_parts_without_time() {
        let input = DateTimeInput::Parts {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            time: None,
        };
        let parsed = parse_input(&input, chrono_tz::UTC).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let input = DateTimeInput::Iso("next tuesday".to_string());
        assert_eq!(
            parse_input(&input, chrono_tz::UTC),
            Err(ParseError::UnrecognizedString("next tuesday".to_string()))
        );
    }

    #[test]
    fn test_resolve_range_defaults_end_to_one_hour() {
        let start = DateTimeInput::Iso("2026-03-01T09:00:00Z".to_string());
        let (start, end) = resolve_range(&start, None, chrono_tz::UTC).unwrap();
        assert_eq!((end - start).num_seconds(), DEFAULT_EVENT_DURATION_SECS);
    }

    #[test]
    fn test_resolve_range_explicit_end() {
        let start = DateTimeInput::Iso("2026-03-01T09:00:00Z".to_string());
        let end = DateTimeInput::Iso("2026-03-01T11:30:00Z".to_string());
        let (start, end) = resolve_range(&start, Some(&end), chrono_tz::UTC).unwrap();
        assert_eq!((end - start).num_minutes(), 150);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Berlin"), Ok(chrono_tz::Europe::Berlin));
        assert_eq!(
            parse_timezone("Mars/Olympus"),
            Err(ParseError::UnknownTimezone("Mars/Olympus".to_string()))
        );
    }
}

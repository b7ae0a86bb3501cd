//! KST timestamp normalization
//!
//! The upstream writes dates in three shapes: full timestamps with dash or
//! dot separators (listing `title` attributes and post pages), date-only
//! values (gallog listings), and year-less short forms on comments
//! (`MM.DD HH:mm:ss`). Everything is interpreted in KST (+09:00) regardless
//! of the local clock.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::ParseError;

/// Korea Standard Time offset (+09:00)
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("KST offset is valid")
}

/// Current instant in KST
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d"];

const SHORT_FORMATS: &[&str] = &["%Y.%m.%d %H:%M:%S", "%Y.%m.%d %H:%M"];

/// Parse a full timestamp, dot or dash separated, seconds optional
pub fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return attach_kst(naive, s);
        }
    }
    Err(ParseError::InvalidDate(s.to_string()))
}

/// Parse a date-only value, pinned to 00:00:00 KST
pub fn parse_date_only(s: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = s.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let naive = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| ParseError::InvalidDate(s.to_string()))?;
            return attach_kst(naive, s);
        }
    }
    Err(ParseError::InvalidDate(s.to_string()))
}

/// Parse a comment timestamp, patching in `year` when the upstream omits it
pub fn parse_comment_datetime_in(
    s: &str,
    year: i32,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = s.trim();
    if let Ok(parsed) = parse_datetime(trimmed) {
        return Ok(parsed);
    }
    for format in SHORT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&format!("{year}.{trimmed}"), format) {
            return attach_kst(naive, s);
        }
    }
    Err(ParseError::InvalidDate(s.to_string()))
}

/// Parse a comment timestamp against the current KST year
pub fn parse_comment_datetime(s: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    parse_comment_datetime_in(s, now_kst().year())
}

fn attach_kst(naive: NaiveDateTime, raw: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    kst()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ParseError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_datetime_dash() {
        let dt = parse_datetime("2025-09-01 12:34:56").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.to_rfc3339(), "2025-09-01T12:34:56+09:00");
    }

    #[test]
    fn test_parse_datetime_dot_no_seconds() {
        let dt = parse_datetime("2025.09.01 12:34").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-01T12:34:00+09:00");
    }

    #[test]
    fn test_parse_date_only_pins_midnight() {
        let dt = parse_date_only("2025.09.01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-01T00:00:00+09:00");

        let dt = parse_date_only("2025-09-01").unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_comment_year_patch() {
        let dt = parse_comment_datetime_in("09.01 12:34:56", 2025).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-01T12:34:56+09:00");
    }

    #[test]
    fn test_comment_full_date_passthrough() {
        let dt = parse_comment_datetime_in("2024.12.31 23:59:59", 2025).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-12-31T23:59:59+09:00");
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(parse_datetime("not a date").is_err());
        assert!(parse_datetime("2025-13-40 99:99:99").is_err());
        assert!(parse_date_only("09.01").is_err());
        assert!(parse_comment_datetime_in("가나다", 2025).is_err());
    }
}

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Default label for a calendar day, matching a US-locale browser date ("12/16/2025").
pub const DEFAULT_DAY_FORMAT: &str = "%-m/%-d/%Y";

/// Parses a `created_at` value into local time.
///
/// This is the only place timestamps are parsed; every stage that filters or
/// buckets by date goes through it, so an invalid value is excluded the same
/// way everywhere. Returns `None` for empty or unparseable input.
///
/// Supported shapes, tried in order:
/// - RFC 3339 with an offset (`2025-12-16T10:30:00Z`, `2025-12-16T10:30:00.123+02:00`)
/// - naive ISO 8601 or SQL datetime (`2025-12-16T10:30:00`, `2025-12-16 10:30:00`),
///   read as local time
/// - date only (`2025-12-16`), read as midnight UTC
/// - anything `dateparser` understands, provided the value names a full
///   calendar date (a four-digit year plus a month and day)
pub fn parse_created_at(timestamp_str: &str) -> Option<DateTime<Local>> {
    let timestamp_str = timestamp_str.trim();
    if timestamp_str.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
        return Some(dt.with_timezone(&Local));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, format) {
            return Local.from_local_datetime(&naive_dt).earliest();
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(timestamp_str, "%Y-%m-%d") {
        let utc_dt = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(utc_dt.with_timezone(&Local));
    }

    if !names_calendar_date(timestamp_str) {
        return None;
    }
    dateparser::parse(timestamp_str)
        .ok()
        .map(|dt: DateTime<Utc>| dt.with_timezone(&Local))
}

const MONTH_PREFIXES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// True when the value carries a year, month and day of its own. Time-only
/// values and bare epochs fail this, since `dateparser` would fill the
/// missing parts from the wall clock.
fn names_calendar_date(value: &str) -> bool {
    let tokens: Vec<&str> = value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let is_numeric = |t: &&str| t.chars().all(|c| c.is_ascii_digit());

    let has_year = tokens.iter().any(|t| is_numeric(t) && t.len() == 4);
    let has_month_name = tokens.iter().any(|t| {
        let lower = t.to_ascii_lowercase();
        lower.len() >= 3 && MONTH_PREFIXES.iter().any(|m| lower.starts_with(m))
    });
    let short_numbers = tokens
        .iter()
        .filter(|t| is_numeric(t) && (1..=2).contains(&t.len()))
        .count();

    has_year && (has_month_name || short_numbers >= 2)
}

/// Local calendar day of a `created_at` value, if it parses.
pub fn created_day(timestamp_str: &str) -> Option<NaiveDate> {
    parse_created_at(timestamp_str).map(|dt| dt.date_naive())
}

/// Formats a timestamp for display in local time, or returns the raw value
/// when it cannot be parsed.
pub fn format_timestamp_to_local(timestamp_str: &str) -> String {
    match parse_created_at(timestamp_str) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_str.to_string(),
    }
}

/// Formats a calendar day with a strftime pattern.
pub fn day_label(day: NaiveDate, format: &str) -> String {
    day.format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_created_at_empty() {
        assert_eq!(parse_created_at(""), None);
        assert_eq!(parse_created_at("   "), None);
    }

    #[test]
    fn test_parse_created_at_rfc3339_with_z() {
        let dt = parse_created_at("2025-12-16T10:30:00Z").unwrap();
        assert_eq!(dt.with_timezone(&Utc).to_rfc3339(), "2025-12-16T10:30:00+00:00");
    }

    #[test]
    fn test_parse_created_at_rfc3339_fractional_offset() {
        let dt = parse_created_at("2025-12-16T10:30:00.123+02:00").unwrap();
        assert_eq!(dt.with_timezone(&Utc).format("%H:%M").to_string(), "08:30");
    }

    #[test]
    fn test_parse_created_at_naive_is_local() {
        let dt = parse_created_at("2025-12-16T10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-12-16 10:30:00");
    }

    #[test]
    fn test_parse_created_at_sqlite_format() {
        let dt = parse_created_at("2025-12-16 10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2025-12-16 10:30");
    }

    #[test]
    fn test_parse_created_at_date_only_is_utc_midnight() {
        let dt = parse_created_at("2025-12-16").unwrap();
        assert_eq!(dt.with_timezone(&Utc).to_rfc3339(), "2025-12-16T00:00:00+00:00");
    }

    #[test]
    fn test_parse_created_at_invalid() {
        assert_eq!(parse_created_at("not-a-timestamp"), None);
        assert_eq!(parse_created_at("2025-13-45T99:00:00Z"), None);
    }

    #[test]
    fn test_parse_created_at_needs_a_calendar_date() {
        assert_eq!(parse_created_at("12:00"), None);
        assert_eq!(parse_created_at("10:30:00 PM"), None);
        assert_eq!(parse_created_at("1511648546"), None);
        assert_eq!(parse_created_at("1511648546000"), None);
    }

    #[test]
    fn test_parse_created_at_dateparser_fallback() {
        let dt = parse_created_at("12/16/2025 10:30").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 16).unwrap());
    }

    #[test]
    fn test_names_calendar_date() {
        assert!(names_calendar_date("12/16/2025"));
        assert!(names_calendar_date("Dec 16, 2025 10:30"));
        assert!(!names_calendar_date("12:00"));
        assert!(!names_calendar_date("May 6 at 9:24 PM"));
        assert!(!names_calendar_date("1511648546"));
    }

    #[test]
    fn test_created_day() {
        let day = created_day("2025-12-16 10:30:00").unwrap();
        assert_eq!((day.year(), day.month(), day.day()), (2025, 12, 16));
        assert_eq!(created_day("garbage"), None);
    }

    #[test]
    fn test_format_timestamp_to_local_invalid_returns_original() {
        assert_eq!(format_timestamp_to_local("not-a-timestamp"), "not-a-timestamp");
        assert_eq!(format_timestamp_to_local("2025-12-16 10:30:00"), "2025-12-16 10:30:00");
    }

    #[test]
    fn test_day_label_default_format() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(day_label(day, DEFAULT_DAY_FORMAT), "3/7/2025");
        assert_eq!(day_label(day, "%Y-%m-%d"), "2025-03-07");
    }
}

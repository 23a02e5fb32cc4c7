//! Low-level field parsing
//!
//! Every helper here is total: malformed input yields `None` (or an empty
//! list) so callers can drop the single slot that carried it.

use chrono::{NaiveDate, NaiveTime};

/// Placeholder strings that tabular exports emit for missing values
const SENTINELS: &[&str] = &[
    "nan",
    "none",
    "null",
    "undefined",
    "n/a",
    "na",
    "-",
    "[object object]",
];

/// Returns true when `value` is one of the known missing-value placeholders
pub fn is_sentinel(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    SENTINELS.contains(&lowered.as_str())
}

/// Parse a finite number, tolerating surrounding whitespace
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer the way a lenient tabular reader would.
///
/// `"7"` and `"7.0"` both yield 7; fractional input is truncated toward zero.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    parse_number(trimmed).map(|v| v.trunc() as i64)
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed.split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    let second: u32 = match parts.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    // from_hms_opt already rejects hour >= 24 and minute >= 60
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, a full timestamp whose first ten characters are a
/// date (`2024-07-01T00:00:00`), and `YYYY/MM/DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y/%m/%d").ok()
}

/// Split a semicolon-delimited list, trimming items and dropping empties
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret a presence flag (`1`, `yes`, `true`, ...)
pub fn parse_flag(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "yes" | "y" | "true" | "t" => true,
        _ => parse_number(&lowered).map_or(false, |v| v > 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 5.5 "), Some(5.5));
        assert_eq!(parse_number("0"), Some(0.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_integer_truncates() {
        assert_eq!(parse_integer("7"), Some(7));
        assert_eq!(parse_integer("7.0"), Some(7));
        assert_eq!(parse_integer("7.9"), Some(7));
        assert_eq!(parse_integer("seven"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("08:30"), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parse_time("8:05"), NaiveTime::from_hms_opt(8, 5, 0));
        assert_eq!(parse_time("23:59:59"), NaiveTime::from_hms_opt(23, 59, 59));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("noon"), None);
        assert_eq!(parse_time("12"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert_eq!(parse_date("2024-07-01"), expected);
        assert_eq!(parse_date("2024-07-01T00:00:00"), expected);
        assert_eq!(parse_date("2024/07/01"), expected);
        assert_eq!(parse_date("July 1st"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("Metformin; Lisinopril ;; "),
            vec!["Metformin".to_string(), "Lisinopril".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_sentinels_and_flags() {
        assert!(is_sentinel("NaN"));
        assert!(is_sentinel(" undefined "));
        assert!(!is_sentinel("Metformin"));

        assert!(parse_flag("1"));
        assert!(parse_flag("Yes"));
        assert!(parse_flag("1.0"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("No"));
    }
}

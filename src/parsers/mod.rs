//! Per-server response dialects. Every parser is a pure function of the raw
//! response text; none of them performs I/O.

pub mod iana;
pub mod icann;
pub mod nominet;
pub mod rdap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

/// `yyyy-MM-dd`-style date at midnight UTC.
pub(crate) fn parse_date(value: &str, format: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    match NaiveDate::parse_from_str(value, format) {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Err(_) => {
            debug!("Failed to parse date {:?} with format {}", value, format);
            None
        }
    }
}

/// ISO-8601 timestamp as used by gTLD registries and RDAP.
pub(crate) fn parse_iso_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some registries omit the offset or use a space separator.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(value, "%Y-%m-%d")
}

/// Hostname of a referral target, stripped of any scheme or path.
pub(crate) fn normalize_referral(value: &str) -> Option<String> {
    let value = value.trim();
    let value = ["whois://", "rwhois://", "http://", "https://"]
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .unwrap_or(value);
    let host = value.split('/').next().unwrap_or("").trim().to_lowercase();
    if host.is_empty() || host.contains(char::is_whitespace) {
        None
    } else {
        Some(host)
    }
}

/// Typed setter registered for a dialect label.
pub(crate) fn setter_for<T: Copy>(table: &[(&str, T)], label: &str) -> Option<T> {
    table.iter().find(|(name, _)| *name == label).map(|(_, setter)| *setter)
}

/// Split `key: value` on the first colon.
pub(crate) fn split_label(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(key, value)| (key.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_formats() {
        let date = parse_date("26-Aug-1999", "%d-%b-%Y").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1999, 8, 26));

        let date = parse_date("1985-01-01", "%Y-%m-%d").unwrap();
        assert_eq!(date.hour(), 0);
    }

    #[test]
    fn test_unparsable_dates_are_omitted() {
        assert!(parse_date("before Aug-1996", "%d-%b-%Y").is_none());
        assert!(parse_iso_date("not a date").is_none());
    }

    #[test]
    fn test_parse_iso_variants() {
        assert!(parse_iso_date("1995-08-14T04:00:00Z").is_some());
        assert!(parse_iso_date("2024-08-14T07:01:34.123+02:00").is_some());
        assert!(parse_iso_date("2024-08-14T07:01:34").is_some());
    }

    #[test]
    fn test_normalize_referral() {
        assert_eq!(normalize_referral(" WHOIS.MarkMonitor.com ").as_deref(), Some("whois.markmonitor.com"));
        assert_eq!(normalize_referral("http://whois.example.net/").as_deref(), Some("whois.example.net"));
        assert_eq!(normalize_referral(""), None);
    }
}

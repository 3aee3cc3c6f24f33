//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC TEXT, the format
//! `datetime('now')` produces, so SQL-side `datetime()` comparisons and
//! Rust-side string comparisons agree.

use chrono::{DateTime, NaiveDateTime, Utc};

const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now() -> String {
    Utc::now().naive_utc().format(STORE_FORMAT).to_string()
}

/// Parses client-supplied datetimes: the storage format itself, the same with
/// a `T` separator, or full RFC 3339. Returns the normalized storage form.
pub fn parse(input: &str) -> Option<String> {
    let input = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, STORE_FORMAT) {
        return Some(dt.format(STORE_FORMAT).to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.format(STORE_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc().format(STORE_FORMAT).to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_storage_formatted() {
        let ts = now();
        assert!(parse(&ts).is_some());
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[10..11], " ");
    }

    #[test]
    fn parse_accepts_storage_format() {
        assert_eq!(
            parse("2031-05-01 18:30:00").as_deref(),
            Some("2031-05-01 18:30:00")
        );
    }

    #[test]
    fn parse_accepts_t_separator() {
        assert_eq!(
            parse("2031-05-01T18:30:00").as_deref(),
            Some("2031-05-01 18:30:00")
        );
    }

    #[test]
    fn parse_normalizes_rfc3339_offsets_to_utc() {
        assert_eq!(
            parse("2031-05-01T18:30:00+02:00").as_deref(),
            Some("2031-05-01 16:30:00")
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("next tuesday").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn storage_format_orders_lexicographically() {
        let earlier = parse("2031-05-01 18:30:00").unwrap();
        let later = parse("2031-05-02 09:00:00").unwrap();
        assert!(earlier < later);
    }
}

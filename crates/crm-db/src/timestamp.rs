//! SQLite timestamp text.
//!
//! Every timestamp column holds UTC as `YYYY-MM-DD HH:MM:SS.SSS`, the same
//! shape `strftime('%Y-%m-%d %H:%M:%f', 'now')` produces for column defaults,
//! so plain string comparison orders rows by time.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn to_sql(ts: DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts the canonical format, SQLite's
/// second-precision `datetime('now')` output, and RFC 3339.
pub fn from_sql(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .or_else(|_| raw.parse::<DateTime<Utc>>())
        .ok()
}

/// Like [`from_sql`] but falls back to the epoch and logs, for display rows
/// where a corrupt value should not fail the whole page.
pub fn from_sql_lossy(raw: &str, context: &str) -> DateTime<Utc> {
    from_sql(raw).unwrap_or_else(|| {
        warn!("Corrupt timestamp '{}' on {}", raw, context);
        DateTime::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millisecond_precision() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(to_sql(ts), "2025-03-04 05:06:07.000");
    }

    #[test]
    fn parses_sqlite_and_rfc3339_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(from_sql("2025-03-04 05:06:07"), Some(expected));
        assert_eq!(from_sql("2025-03-04 05:06:07.000"), Some(expected));
        assert_eq!(from_sql("2025-03-04T05:06:07Z"), Some(expected));
        assert_eq!(from_sql("yesterday"), None);
    }

    #[test]
    fn text_order_matches_time_order() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert!(to_sql(earlier) < to_sql(later));
    }
}

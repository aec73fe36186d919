//! Timestamp helpers.
//!
//! Every timestamp that feeds a hash (block headers, audit entries) is
//! rendered through [`to_iso_millis`] so canonicalization is byte-identical
//! regardless of caller timezone or clock source.

use chrono::{DateTime, Utc};

/// Returns the current UTC wall-clock time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Renders `ts` as ISO-8601 UTC with millisecond precision, e.g.
/// `"2026-07-28T12:00:00.000Z"`.
pub fn to_iso_millis(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Milliseconds since the Unix epoch, used by id generation and signing.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_millis_has_fixed_format() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(6);
        assert_eq!(to_iso_millis(&ts), "2026-01-02T03:04:05.006Z");
    }
}

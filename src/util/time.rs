//! Timestamp extraction across the date encodings seen in agent history
//! stores: unix seconds, unix milliseconds, and ISO-8601 strings with or
//! without an offset.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Numeric values at or above this magnitude are already milliseconds;
/// below it they are unix seconds. (Unix seconds stay under 1e10 until
/// the year 2286.)
const MILLIS_THRESHOLD: f64 = 1e10;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Parse a JSON value into epoch milliseconds.
///
/// Accepts integers and floats (seconds or milliseconds, disambiguated by
/// magnitude), numeric strings, and ISO-8601 strings. Returns `None` for
/// anything unparseable; callers substitute a neutral score instead of
/// failing.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(normalize_epoch),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn normalize_epoch(raw: f64) -> Option<i64> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    if raw >= MILLIS_THRESHOLD {
        Some(raw as i64)
    } else {
        Some((raw * 1000.0) as i64)
    }
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return normalize_epoch(n);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    // ISO-8601 without an offset.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

/// Field names checked, in priority order, when resolving a record-level
/// timestamp.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "created_at",
    "createdAt",
    "timestamp",
    "updated_at",
    "lastUpdatedAt",
    "unixMs",
];

/// Resolve a timestamp from a raw record: top-level fields first, then the
/// same fields nested under `metadata`.
pub fn resolve_record_timestamp(record: &Value) -> Option<i64> {
    for field in TIMESTAMP_FIELDS {
        if let Some(ts) = record.get(field).and_then(parse_timestamp) {
            return Some(ts);
        }
    }
    let meta = record.get("metadata")?;
    for field in TIMESTAMP_FIELDS {
        if let Some(ts) = meta.get(field).and_then(parse_timestamp) {
            return Some(ts);
        }
    }
    None
}

/// Fractional days elapsed between two epoch-millisecond instants.
/// Clamped at zero so future timestamps never produce negative ages.
pub fn days_between_millis(earlier_ms: i64, later_ms: i64) -> f64 {
    let delta = (later_ms - earlier_ms).max(0);
    delta as f64 / MILLIS_PER_DAY
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_seconds_scale_to_millis() {
        assert_eq!(parse_timestamp(&json!(1_700_000_000)), Some(1_700_000_000_000));
    }

    #[test]
    fn numeric_millis_pass_through() {
        assert_eq!(
            parse_timestamp(&json!(1_700_000_000_000_i64)),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn iso_with_offset() {
        let ts = parse_timestamp(&json!("2023-11-14T22:13:20Z")).unwrap();
        assert_eq!(ts, 1_700_000_000_000);
    }

    #[test]
    fn iso_without_offset() {
        let ts = parse_timestamp(&json!("2023-11-14T22:13:20")).unwrap();
        assert_eq!(ts, 1_700_000_000_000);
    }

    #[test]
    fn numeric_string_accepted() {
        assert_eq!(parse_timestamp(&json!("1700000000")), Some(1_700_000_000_000));
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(parse_timestamp(&json!("not a date")), None);
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!(-5)), None);
        assert_eq!(parse_timestamp(&json!({"nested": true})), None);
    }

    #[test]
    fn record_resolution_prefers_created_at() {
        let record = json!({
            "created_at": 1_700_000_000,
            "timestamp": 1_600_000_000,
        });
        assert_eq!(resolve_record_timestamp(&record), Some(1_700_000_000_000));
    }

    #[test]
    fn record_resolution_falls_back_to_metadata() {
        let record = json!({ "metadata": { "lastUpdatedAt": 1_700_000_000_000_i64 } });
        assert_eq!(resolve_record_timestamp(&record), Some(1_700_000_000_000));
    }

    #[test]
    fn days_between_is_clamped() {
        assert_eq!(days_between_millis(2_000, 1_000), 0.0);
        let one_day = days_between_millis(0, 86_400_000);
        assert!((one_day - 1.0).abs() < f64::EPSILON);
    }
}

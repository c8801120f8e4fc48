//! Timestamp storage helpers. Timestamps are stored as UTC microseconds.

use chrono::{DateTime, TimeZone, Utc};

pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Convert stored microseconds back to a timestamp.
/// Out-of-range values clamp to the Unix epoch.
pub fn from_micros(micros: i64) -> DateTime<Utc> {
    Utc.timestamp_micros(micros)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micros_roundtrip_keeps_subsecond_precision() {
        let ts = Utc.with_ymd_and_hms(2006, 6, 8, 10, 44, 53).unwrap()
            + chrono::Duration::microseconds(250);
        assert_eq!(from_micros(to_micros(ts)), ts);
    }
}

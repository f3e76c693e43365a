//! InfluxDB line-protocol encoding.
//!
//! One record becomes one line:
//!
//! ```text
//! aranet4_readings,device=aranet4,location=office,mac_address=AA:.. \
//!     co2=800i,temperature_f=72.5,humidity=45i,pressure=1013.2,battery=85i 1700000000
//! ```
//!
//! Timestamps are encoded as Unix seconds; the write request sets
//! `precision=s` to match.

use std::fmt::Write as _;

use crate::record::{MeasurementRecord, MEASUREMENT};

/// Escape a tag key or tag value.
///
/// Line protocol requires commas, equals signs, and spaces in tags to be
/// backslash-escaped.
fn escape_tag(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Encode one record as a line-protocol line (no trailing newline).
#[must_use]
pub fn encode_record(record: &MeasurementRecord) -> String {
    let mut line = String::with_capacity(128);
    let _ = write!(
        line,
        "{},device={},location={},mac_address={}",
        MEASUREMENT,
        escape_tag(&record.tags.device),
        escape_tag(&record.tags.location),
        escape_tag(&record.tags.mac_address),
    );
    let _ = write!(
        line,
        " co2={}i,temperature_f={},humidity={}i,pressure={}",
        record.co2, record.temperature_f, record.humidity, record.pressure,
    );
    if let Some(battery) = record.battery {
        let _ = write!(line, ",battery={battery}i");
    }
    let _ = write!(line, " {}", record.timestamp.unix_timestamp());
    line
}

/// Encode a batch of records as a newline-separated request body.
#[must_use]
pub fn encode_batch(records: &[MeasurementRecord]) -> String {
    records
        .iter()
        .map(encode_record)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTags;
    use time::OffsetDateTime;

    fn record() -> MeasurementRecord {
        MeasurementRecord {
            tags: RecordTags {
                device: "aranet4".into(),
                location: "office".into(),
                mac_address: "AA:BB:CC:DD:EE:FF".into(),
            },
            co2: 800,
            temperature_f: 72.5,
            humidity: 45,
            pressure: 1013.2,
            battery: Some(85),
            timestamp: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        }
    }

    #[test]
    fn test_encode_record() {
        let line = encode_record(&record());
        assert_eq!(
            line,
            "aranet4_readings,device=aranet4,location=office,mac_address=AA:BB:CC:DD:EE:FF \
             co2=800i,temperature_f=72.5,humidity=45i,pressure=1013.2,battery=85i 1700000000"
        );
    }

    #[test]
    fn test_integer_fields_carry_suffix() {
        let line = encode_record(&record());
        assert!(line.contains("co2=800i"));
        assert!(line.contains("humidity=45i"));
        assert!(line.contains("battery=85i"));
        // Floats must not.
        assert!(line.contains("temperature_f=72.5,"));
    }

    #[test]
    fn test_missing_battery_omits_field() {
        let mut rec = record();
        rec.battery = None;

        let line = encode_record(&rec);
        assert!(!line.contains("battery"));
        assert!(line.contains("pressure=1013.2 "));
    }

    #[test]
    fn test_tag_escaping() {
        let mut rec = record();
        rec.tags.location = "living room, upstairs".into();

        let line = encode_record(&rec);
        assert!(line.contains("location=living\\ room\\,\\ upstairs"));
    }

    #[test]
    fn test_encode_batch_joins_with_newlines() {
        let body = encode_batch(&[record(), record()]);
        assert_eq!(body.lines().count(), 2);
    }

    #[test]
    fn test_encode_empty_batch() {
        assert_eq!(encode_batch(&[]), "");
    }
}

//! CSV import of readings exported from the Aranet mobile app.
//!
//! Export columns, in order: timestamp (`MM/DD/YYYY h:mm:ss AM/PM`),
//! CO2 in ppm, temperature in °F, humidity in %, pressure in atm.
//! Temperature is stored as-is; pressure is converted to hPa.
//!
//! Malformed or implausible rows are skipped, not fatal: one bad export row
//! should never lose the rest of the file.

use std::io::Read;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};

use airlog_types::units::atmospheres_to_hectopascals;

use crate::error::{Result, RowError};
use crate::record::{MeasurementRecord, RecordTags};

/// Number of columns an export row must have.
const EXPECTED_COLUMNS: usize = 5;

/// Timestamp format used by the app's CSV export.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] \
     [hour repr:12 padding:none]:[minute]:[second] [period]"
);

/// Plausibility bounds for the temperature column, already in Fahrenheit
/// (-50..=80 °C converted).
const TEMP_F_MIN: f64 = -58.0;
const TEMP_F_MAX: f64 = 176.0;

/// One successfully parsed export row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedReading {
    /// Measurement time (the export's local-less timestamp, taken as UTC).
    pub timestamp: OffsetDateTime,
    /// CO2 concentration in ppm.
    pub co2: i64,
    /// Temperature in degrees Fahrenheit, as exported.
    pub temperature_f: f64,
    /// Relative humidity percentage.
    pub humidity: i64,
    /// Atmospheric pressure converted to hPa.
    pub pressure: f64,
}

impl ImportedReading {
    /// Convert to a store record with the given deployment tags.
    #[must_use]
    pub fn into_record(self, tags: RecordTags) -> MeasurementRecord {
        MeasurementRecord {
            tags,
            co2: self.co2,
            temperature_f: self.temperature_f,
            humidity: self.humidity,
            pressure: self.pressure,
            battery: None,
            timestamp: self.timestamp,
        }
    }
}

/// Result of importing a whole CSV file.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Rows that parsed and passed the plausibility check, in file order.
    pub readings: Vec<ImportedReading>,
    /// Rows that were skipped.
    pub skipped: usize,
}

fn parse_number(field: &str, name: &'static str) -> std::result::Result<f64, RowError> {
    field.trim().parse::<f64>().map_err(|_| RowError::BadNumber {
        field: name,
        value: field.to_string(),
    })
}

/// Parse one export row.
///
/// # Errors
///
/// Returns a [`RowError`] describing what made the row unusable.
pub fn parse_row(row: &csv::StringRecord) -> std::result::Result<ImportedReading, RowError> {
    if row.len() < EXPECTED_COLUMNS {
        return Err(RowError::ColumnCount {
            expected: EXPECTED_COLUMNS,
            actual: row.len(),
        });
    }

    let raw_time = row[0].trim();
    let timestamp = PrimitiveDateTime::parse(raw_time, TIMESTAMP_FORMAT)
        .map_err(|_| RowError::BadTimestamp(raw_time.to_string()))?
        .assume_utc();

    let co2 = parse_number(&row[1], "co2")?.round() as i64;
    let temperature_f = parse_number(&row[2], "temperature")?;
    let humidity = parse_number(&row[3], "humidity")?.round() as i64;
    let pressure_atm = parse_number(&row[4], "pressure")?;

    if co2 <= 0 {
        return Err(RowError::Implausible(format!("CO2 {co2} ppm")));
    }
    if !(TEMP_F_MIN..=TEMP_F_MAX).contains(&temperature_f) {
        return Err(RowError::Implausible(format!(
            "temperature {temperature_f}°F"
        )));
    }

    Ok(ImportedReading {
        timestamp,
        co2,
        temperature_f,
        humidity,
        pressure: atmospheres_to_hectopascals(pressure_atm),
    })
}

/// Read an exported CSV, skipping rows that fail to parse.
///
/// The first line is treated as a header. Skipped rows are logged with
/// their line number and the reason.
///
/// # Errors
///
/// Returns [`crate::StoreError::Csv`] only for file-level reader failures;
/// individual bad rows are counted in the summary instead.
pub fn import_csv<R: Read>(reader: R) -> Result<ImportSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ImportSummary::default();

    for (index, row) in csv_reader.records().enumerate() {
        // Line 1 is the header, so data row N sits on line N + 1.
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping line {}: {}", line, e);
                summary.skipped += 1;
                continue;
            }
        };

        match parse_row(&row) {
            Ok(reading) => summary.readings.push(reading),
            Err(e) => {
                warn!("Skipping line {}: {}", line, e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "Parsed {} reading(s), skipped {} row(s)",
        summary.readings.len(),
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Time,Carbon dioxide(ppm),Temperature(°F),Humidity(%),Atmospheric pressure(atm)\n";

    fn import(rows: &str) -> ImportSummary {
        import_csv(format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_valid_row() {
        let summary = import("06/15/2024 2:30:45 PM,650,72.5,45,1.0\n");

        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.readings.len(), 1);

        let reading = &summary.readings[0];
        assert_eq!(reading.co2, 650);
        assert!((reading.temperature_f - 72.5).abs() < 0.001);
        assert_eq!(reading.humidity, 45);
        assert_eq!(reading.pressure, 1013.25);

        let ts = reading.timestamp;
        assert_eq!(ts.year(), 2024);
        assert_eq!(u8::from(ts.month()), 6);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 30);
        assert_eq!(ts.second(), 45);
    }

    #[test]
    fn test_parses_am_and_padded_fields() {
        let summary = import("01/05/2024 9:05:00 AM,700,68.0,50,0.99\n");
        assert_eq!(summary.readings.len(), 1);
        assert_eq!(summary.readings[0].timestamp.hour(), 9);
    }

    #[test]
    fn test_bad_row_skipped_rest_kept() {
        let summary = import(
            "06/15/2024 2:30:45 PM,650,72.5,45,1.0\n\
             not-a-date,650,72.5,45,1.0\n\
             06/15/2024 2:40:45 PM,abc,72.5,45,1.0\n\
             06/15/2024 2:50:45 PM,660,73.0,46,1.0\n",
        );

        assert_eq!(summary.readings.len(), 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.readings[1].co2, 660);
    }

    #[test]
    fn test_implausible_rows_skipped() {
        let summary = import(
            "06/15/2024 2:30:45 PM,0,72.5,45,1.0\n\
             06/15/2024 2:40:45 PM,650,200.0,45,1.0\n",
        );

        assert!(summary.readings.is_empty());
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_short_row_skipped() {
        let summary = import("06/15/2024 2:30:45 PM,650,72.5\n");
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_empty_file() {
        let summary = import_csv(HEADER.as_bytes()).unwrap();
        assert!(summary.readings.is_empty());
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_into_record_leaves_battery_unset() {
        let summary = import("06/15/2024 2:30:45 PM,650,72.5,45,1.0\n");
        let record = summary.readings[0].clone().into_record(RecordTags {
            device: "aranet4".into(),
            location: "office".into(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
        });

        assert_eq!(record.battery, None);
        assert_eq!(record.co2, 650);
    }
}

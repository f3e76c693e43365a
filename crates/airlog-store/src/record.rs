//! The measurement record written to InfluxDB.

use time::OffsetDateTime;

use airlog_types::units::celsius_to_fahrenheit;
use airlog_types::SensorReading;

/// Measurement name used for every record.
pub const MEASUREMENT: &str = "aranet4_readings";

/// Tag values attached to every record for a given deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTags {
    /// Logical device name, e.g. `aranet4`.
    pub device: String,
    /// Where the sensor lives, e.g. `office`.
    pub location: String,
    /// Bluetooth MAC address of the sensor.
    pub mac_address: String,
}

/// One InfluxDB point: fixed measurement, deployment tags, sensor fields.
///
/// Temperature is stored in Fahrenheit (the dashboards expect it that way);
/// pressure stays in hPa.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub tags: RecordTags,
    /// CO2 concentration in ppm.
    pub co2: i64,
    /// Temperature in degrees Fahrenheit.
    pub temperature_f: f64,
    /// Relative humidity percentage.
    pub humidity: i64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// Battery level percentage. CSV exports do not carry battery, so
    /// imported records leave it unset.
    pub battery: Option<i64>,
    /// Measurement time.
    pub timestamp: OffsetDateTime,
}

impl MeasurementRecord {
    /// Build a record from a live or historical sensor reading.
    ///
    /// Converts temperature from Celsius to Fahrenheit. Readings without a
    /// timestamp are stamped with `fallback`.
    #[must_use]
    pub fn from_reading(
        reading: &SensorReading,
        tags: RecordTags,
        fallback: OffsetDateTime,
    ) -> Self {
        Self {
            tags,
            co2: i64::from(reading.co2),
            temperature_f: f64::from(celsius_to_fahrenheit(reading.temperature)),
            humidity: i64::from(reading.humidity),
            pressure: f64::from(reading.pressure),
            battery: Some(i64::from(reading.battery)),
            timestamp: reading.timestamp.unwrap_or(fallback),
        }
    }

    /// Replace the battery field.
    ///
    /// History records carry no battery level of their own; the backfill
    /// path stamps the level read live from the device once, or omits the
    /// field entirely, instead of persisting a per-record zero.
    #[must_use]
    pub fn with_battery(mut self, battery: Option<i64>) -> Self {
        self.battery = battery;
        self
    }
}

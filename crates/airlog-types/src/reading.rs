//! Sensor reading types and wire-format parsing.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// CO2 status indicator shown by the device's traffic-light LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Status {
    /// Status could not be determined.
    Error = 0,
    /// CO2 level is good (green).
    Green = 1,
    /// CO2 level is elevated (yellow).
    Yellow = 2,
    /// CO2 level is high (red).
    Red = 3,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        match value {
            1 => Status::Green,
            2 => Status::Yellow,
            3 => Status::Red,
            _ => Status::Error,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Error => write!(f, "Error"),
            Status::Green => write!(f, "Good"),
            Status::Yellow => write!(f, "Moderate"),
            Status::Red => write!(f, "High"),
        }
    }
}

/// Minimum number of bytes required to parse a [`SensorReading`] from the
/// current-readings characteristic.
pub const MIN_READING_BYTES: usize = 13;

/// One point-in-time (or historical) measurement from an Aranet4 sensor.
///
/// Immutable once read: created by the acquisition step, consumed by the
/// persistence step, discarded after.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    /// CO2 concentration in ppm.
    pub co2: u16,
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity percentage (0-100).
    pub humidity: u8,
    /// Atmospheric pressure in hPa.
    pub pressure: f32,
    /// Battery level percentage (0-100).
    pub battery: u8,
    /// CO2 status indicator.
    pub status: Status,
    /// Measurement interval in seconds.
    pub interval: u16,
    /// Age of the reading in seconds since the device last measured.
    pub age: u16,
    /// When the measurement was taken, if known.
    ///
    /// Set to `now - age` for live reads, or back-calculated from the
    /// device's interval for historical records.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub timestamp: Option<time::OffsetDateTime>,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            co2: 0,
            temperature: 0.0,
            humidity: 0,
            pressure: 0.0,
            battery: 0,
            status: Status::Error,
            interval: 0,
            age: 0,
            timestamp: None,
        }
    }
}

impl SensorReading {
    /// Parse a `SensorReading` from the current-readings characteristic payload.
    ///
    /// The byte format is:
    /// - bytes 0-1: CO2 (u16 LE)
    /// - bytes 2-3: Temperature (u16 LE, divide by 20 for Celsius)
    /// - bytes 4-5: Pressure (u16 LE, divide by 10 for hPa)
    /// - byte 6: Humidity (u8)
    /// - byte 7: Battery (u8)
    /// - byte 8: Status (u8)
    /// - bytes 9-10: Interval (u16 LE)
    /// - bytes 11-12: Age (u16 LE)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] if `data` contains fewer than
    /// [`MIN_READING_BYTES`] (13) bytes.
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        use bytes::Buf;

        if data.len() < MIN_READING_BYTES {
            return Err(ParseError::InsufficientBytes {
                expected: MIN_READING_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let co2 = buf.get_u16_le();
        let temp_raw = buf.get_u16_le();
        let pressure_raw = buf.get_u16_le();
        let humidity = buf.get_u8();
        let battery = buf.get_u8();
        let status = Status::from(buf.get_u8());
        let interval = buf.get_u16_le();
        let age = buf.get_u16_le();

        Ok(SensorReading {
            co2,
            temperature: f32::from(temp_raw) / 20.0,
            humidity,
            pressure: f32::from(pressure_raw) / 10.0,
            battery,
            status,
            interval,
            age,
            timestamp: None,
        })
    }

    /// Stamp the reading with its measurement time, `now - age`.
    #[must_use]
    pub fn with_timestamp_from(mut self, now: time::OffsetDateTime) -> Self {
        self.timestamp = Some(now - time::Duration::seconds(i64::from(self.age)));
        self
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CO2 {} ppm, {:.1}°C, {}% RH, {:.1} hPa, battery {}%",
            self.co2, self.temperature, self.humidity, self.pressure, self.battery
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading_from_valid_bytes() {
        // CO2: 800 -> [0x20, 0x03]
        // Temperature: 450 raw (22.5°C = 450/20) -> [0xC2, 0x01]
        // Pressure: 10132 raw (1013.2 hPa = 10132/10) -> [0x94, 0x27]
        let bytes: [u8; 13] = [
            0x20, 0x03, // CO2 = 800
            0xC2, 0x01, // temp_raw = 450
            0x94, 0x27, // pressure_raw = 10132
            45,   // humidity
            85,   // battery
            1,    // status = Green
            0x2C, 0x01, // interval = 300
            0x78, 0x00, // age = 120
        ];

        let reading = SensorReading::from_bytes(&bytes).unwrap();

        assert_eq!(reading.co2, 800);
        assert!((reading.temperature - 22.5).abs() < 0.01);
        assert!((reading.pressure - 1013.2).abs() < 0.1);
        assert_eq!(reading.humidity, 45);
        assert_eq!(reading.battery, 85);
        assert_eq!(reading.status, Status::Green);
        assert_eq!(reading.interval, 300);
        assert_eq!(reading.age, 120);
        assert!(reading.timestamp.is_none());
    }

    #[test]
    fn test_parse_reading_from_insufficient_bytes() {
        let bytes: [u8; 10] = [0; 10];

        let result = SensorReading::from_bytes(&bytes);

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("requires 13 bytes"));
    }

    #[test]
    fn test_parse_reading_extra_bytes_ignored() {
        let mut bytes = vec![0u8; 13];
        bytes[0] = 0xE8;
        bytes[1] = 0x03; // CO2 = 1000
        bytes.extend_from_slice(&[0xFF, 0xFF]);

        let reading = SensorReading::from_bytes(&bytes).unwrap();
        assert_eq!(reading.co2, 1000);
    }

    #[test]
    fn test_status_from_u8() {
        assert_eq!(Status::from(1), Status::Green);
        assert_eq!(Status::from(2), Status::Yellow);
        assert_eq!(Status::from(3), Status::Red);
        assert_eq!(Status::from(0), Status::Error);
        assert_eq!(Status::from(42), Status::Error);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_reading_serializes_without_empty_timestamp() {
        let reading = SensorReading {
            co2: 800,
            ..SensorReading::default()
        };
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["co2"], 800);
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn test_with_timestamp_from_subtracts_age() {
        let now = time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let reading = SensorReading {
            age: 120,
            ..SensorReading::default()
        }
        .with_timestamp_from(now);

        assert_eq!(
            reading.timestamp.unwrap().unix_timestamp(),
            1_700_000_000 - 120
        );
    }
}

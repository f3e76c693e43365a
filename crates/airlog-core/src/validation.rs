//! Plausibility validation for sensor readings.
//!
//! A reading that passes the wire-format parse can still be garbage: a
//! garbled transfer shows up as CO2 of zero or a temperature no room has
//! ever had. Every reading is checked against these bounds before it is
//! allowed anywhere near the store.

use core::fmt;

use airlog_types::SensorReading;

/// Why a reading was judged implausible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationFailure {
    /// CO2 must be strictly positive; the sensor never reports 0 ppm.
    NonPositiveCo2 { co2: u16 },
    /// Temperature outside the plausible range.
    TemperatureOutOfRange { temperature: f32, min: f32, max: f32 },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveCo2 { co2 } => {
                write!(f, "CO2 reading of {} ppm is not plausible", co2)
            }
            Self::TemperatureOutOfRange {
                temperature,
                min,
                max,
            } => write!(
                f,
                "temperature {:.1}°C outside plausible range [{}, {}]",
                temperature, min, max
            ),
        }
    }
}

/// Plausibility bounds for a reading.
#[derive(Debug, Clone, Copy)]
pub struct ReadingValidator {
    /// Minimum plausible temperature in °C.
    pub temp_min: f32,
    /// Maximum plausible temperature in °C.
    pub temp_max: f32,
}

impl Default for ReadingValidator {
    fn default() -> Self {
        Self {
            temp_min: -50.0,
            temp_max: 80.0,
        }
    }
}

impl ReadingValidator {
    /// Check a reading against the bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationFailure`] encountered: zero CO2, then
    /// temperature out of `[temp_min, temp_max]`.
    pub fn validate(&self, reading: &SensorReading) -> Result<(), ValidationFailure> {
        if reading.co2 == 0 {
            return Err(ValidationFailure::NonPositiveCo2 { co2: reading.co2 });
        }
        if reading.temperature < self.temp_min || reading.temperature > self.temp_max {
            return Err(ValidationFailure::TemperatureOutOfRange {
                temperature: reading.temperature,
                min: self.temp_min,
                max: self.temp_max,
            });
        }
        Ok(())
    }
}

//! Unit conversions applied before readings are persisted.
//!
//! The conversions are total over all finite inputs; plausibility bounds are
//! enforced separately by validation, not here.

/// Convert a temperature from Celsius to Fahrenheit.
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert a pressure from standard atmospheres to hectopascals.
///
/// Used by the CSV import path, whose source files record pressure in atm.
#[must_use]
pub fn atmospheres_to_hectopascals(atm: f64) -> f64 {
    atm * 1013.25
}

//! Platform-agnostic types for Aranet4 sensor logging.
//!
//! This crate provides the shared data model used by the BLE side
//! (airlog-core) and the storage side (airlog-store):
//!
//! - [`SensorReading`] and its wire-format parsing
//! - [`Status`] CO2 indicator
//! - Unit conversions applied before persistence
//! - UUID constants for BLE services and characteristics
//! - Error types for payload parsing

pub mod error;
pub mod reading;
pub mod units;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use reading::{MIN_READING_BYTES, SensorReading, Status};
pub use uuid as uuids;

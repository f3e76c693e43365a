//! Error types for airlog-core.
//!
//! This module defines all error types that can occur when acquiring a
//! reading from the sensor via Bluetooth Low Energy.
//!
//! # Retry classification
//!
//! The retry module treats errors as retryable or not:
//!
//! - [`Error::Timeout`], [`Error::Bluetooth`], [`Error::NotConnected`],
//!   [`Error::Io`] and [`Error::ImplausibleReading`] are retryable: BLE is
//!   noisy, and an implausible reading usually means a garbled transfer that
//!   a fresh read resolves.
//! - [`Error::DeviceNotFound`] is retryable too, except when no Bluetooth
//!   adapter is present: a sensor that is out of range or busy shows up as
//!   not-found after a scan, and the next attempt may see it.
//! - [`Error::CharacteristicNotFound`], [`Error::InvalidData`] and
//!   [`Error::InvalidConfig`] are not, since retrying cannot fix an
//!   unsupported firmware or a bad setting.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when communicating with the sensor.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Operation attempted while not connected to device.
    #[error("Not connected to device")]
    NotConnected,

    /// Required BLE characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// Failed to parse data received from device.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Invalid reading format from sensor.
    #[error("Invalid reading format: expected {expected} bytes, got {actual}")]
    InvalidReadingFormat {
        /// Expected data size.
        expected: usize,
        /// Actual data size received.
        actual: usize,
    },

    /// Reading failed the plausibility check (CO2 or temperature out of range).
    ///
    /// Treated as a read failure: the live-logging path retries it the same
    /// way it retries a transport error.
    #[error("Implausible reading: {0}")]
    ImplausibleReading(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reason why a device was not found.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No devices found during scan.
    NoDevicesInRange,
    /// Device with specified name/address not found.
    NotFound { identifier: String },
    /// Scan timed out before finding device.
    ScanTimeout { duration: Duration },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDevicesInRange => write!(f, "no devices in range"),
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::ScanTimeout { duration } => write!(f, "scan timed out after {:?}", duration),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }

    /// Create an implausible reading error.
    pub fn implausible(message: impl Into<String>) -> Self {
        Self::ImplausibleReading(message.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether a retry has any chance of succeeding.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Bluetooth(_)
            | Error::NotConnected
            | Error::Timeout { .. }
            | Error::Io(_)
            | Error::ImplausibleReading(_) => true,
            // Out-of-range and busy sensors both present as not-found after
            // a scan; a missing adapter will not come back.
            Error::DeviceNotFound(reason) => {
                !matches!(reason, DeviceNotFoundReason::NoAdapter)
            }
            _ => false,
        }
    }
}

impl From<airlog_types::ParseError> for Error {
    fn from(err: airlog_types::ParseError) -> Self {
        match err {
            airlog_types::ParseError::InsufficientBytes { expected, actual } => {
                Error::InvalidReadingFormat { expected, actual }
            }
            airlog_types::ParseError::InvalidData(msg) => Error::InvalidData(msg),
            // Handle future ParseError variants (non_exhaustive)
            _ => Error::InvalidData(format!("Parse error: {}", err)),
        }
    }
}

/// Result type alias using airlog-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::device_not_found("Aranet4 12345");
        assert!(err.to_string().contains("Aranet4 12345"));

        let err = Error::NotConnected;
        assert_eq!(err.to_string(), "Not connected to device");

        let err = Error::characteristic_not_found("0x2A19", 5);
        assert!(err.to_string().contains("0x2A19"));
        assert!(err.to_string().contains("5 services"));

        let err = Error::timeout("read_current", Duration::from_secs(10));
        assert!(err.to_string().contains("read_current"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::NotConnected.is_retryable());
        assert!(Error::timeout("read", Duration::from_secs(5)).is_retryable());
        assert!(Error::implausible("co2 is 0").is_retryable());
        // A sensor out of range is a transient not-found.
        assert!(Error::device_not_found("AA:BB:CC:DD:EE:FF").is_retryable());
        assert!(
            Error::DeviceNotFound(DeviceNotFoundReason::ScanTimeout {
                duration: Duration::from_secs(10)
            })
            .is_retryable()
        );

        assert!(!Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter).is_retryable());
        assert!(!Error::invalid_config("missing MAC").is_retryable());
        assert!(!Error::InvalidData("garbage".into()).is_retryable());
        assert!(!Error::characteristic_not_found("f0cd3001", 3).is_retryable());
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = airlog_types::ParseError::InsufficientBytes {
            expected: 13,
            actual: 7,
        }
        .into();
        assert!(matches!(
            err,
            Error::InvalidReadingFormat {
                expected: 13,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}

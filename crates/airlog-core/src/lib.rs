//! BLE acquisition library for Aranet4 sensors.
//!
//! This crate owns the Bluetooth side of the logging pipeline:
//!
//! - Scanning for and connecting to a sensor ([`scan`], [`Device`])
//! - Reading current values and downloading stored history
//! - Plausibility validation of readings ([`validation`])
//! - A uniform bounded retry policy ([`RetryPolicy`], [`with_retry`])
//! - The [`Sensor`] trait seam and a [`MockSensor`] for tests
//! - Exploratory Eve Room scanners ([`explore`], experimental)
//!
//! # Example
//!
//! ```no_run
//! use airlog_core::Device;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = Device::connect("AA:BB:CC:DD:EE:FF").await?;
//!     let reading = device.read_current().await?;
//!     println!("{}", reading);
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod explore;
pub mod history;
pub mod mock;
pub mod retry;
pub mod scan;
pub mod traits;
pub mod util;
pub mod validation;

pub use device::{ConnectionConfig, Device};
pub use error::{DeviceNotFoundReason, Error, Result};
pub use history::{HistoryInfo, HistoryOptions, HistoryParam};
pub use mock::MockSensor;
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, Retryable, RetryPolicy, with_retry};
pub use scan::{DiscoveredDevice, ScanOptions, scan_with_options};
pub use traits::Sensor;
pub use validation::{ReadingValidator, ValidationFailure};

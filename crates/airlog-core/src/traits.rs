//! Trait abstraction for sensor operations.
//!
//! [`Sensor`] is the seam between the logging cycle and the Bluetooth stack:
//! the real [`crate::Device`] and the test [`crate::MockSensor`] both
//! implement it, so cycle logic can be exercised without hardware.

use async_trait::async_trait;

use airlog_types::SensorReading;

use crate::error::Result;
use crate::history::{HistoryInfo, HistoryOptions};

/// Operations the logging cycle needs from a sensor.
///
/// # Example
///
/// ```ignore
/// use airlog_core::{Sensor, Result};
///
/// async fn print_reading<S: Sensor>(sensor: &S) -> Result<()> {
///     let reading = sensor.read_current().await?;
///     println!("CO2: {} ppm", reading.co2);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Get the device address or identifier.
    fn address(&self) -> &str;

    /// Read the current sensor values.
    async fn read_current(&self) -> Result<SensorReading>;

    /// Read the battery level (0-100).
    async fn read_battery(&self) -> Result<u8>;

    /// Get information about stored history.
    async fn get_history_info(&self) -> Result<HistoryInfo>;

    /// Download historical readings.
    async fn download_history(&self, options: HistoryOptions) -> Result<Vec<SensorReading>>;

    /// Disconnect from the device.
    async fn disconnect(&self) -> Result<()>;
}

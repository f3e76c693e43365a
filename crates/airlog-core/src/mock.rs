//! Mock sensor implementation for testing.
//!
//! [`MockSensor`] implements the [`Sensor`] trait so cycle logic can be
//! unit-tested without BLE hardware. It supports failure injection,
//! including a fail-N-times-then-succeed mode for exercising retry bounds.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use airlog_types::{SensorReading, Status};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::history::{HistoryInfo, HistoryOptions};
use crate::traits::Sensor;

/// A mock sensor for testing.
///
/// # Example
///
/// ```
/// use airlog_core::{MockSensor, Sensor};
///
/// #[tokio::main]
/// async fn main() {
///     let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
///     let reading = sensor.read_current().await.unwrap();
///     assert_eq!(reading.co2, 800);
/// }
/// ```
pub struct MockSensor {
    address: String,
    current_reading: RwLock<SensorReading>,
    history: RwLock<Vec<SensorReading>>,
    battery: RwLock<u8>,
    read_count: AtomicU32,
    should_fail: AtomicBool,
    /// Failures remaining before operations start succeeding again.
    remaining_failures: AtomicU32,
}

impl std::fmt::Debug for MockSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSensor")
            .field("address", &self.address)
            .field("read_count", &self.read_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockSensor {
    /// Create a mock sensor with a typical default reading.
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            current_reading: RwLock::new(Self::default_reading()),
            history: RwLock::new(Vec::new()),
            battery: RwLock::new(85),
            read_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            remaining_failures: AtomicU32::new(0),
        }
    }

    fn default_reading() -> SensorReading {
        SensorReading {
            co2: 800,
            temperature: 22.5,
            humidity: 50,
            pressure: 1013.2,
            battery: 85,
            status: Status::Green,
            interval: 300,
            age: 60,
            timestamp: None,
        }
    }

    /// Replace the reading returned by `read_current`.
    pub async fn set_reading(&self, reading: SensorReading) {
        *self.current_reading.write().await = reading;
    }

    /// Replace the history returned by `download_history`.
    pub async fn set_history(&self, history: Vec<SensorReading>) {
        *self.history.write().await = history;
    }

    /// Make every operation fail until cleared.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Make the next `count` operations fail, then succeed.
    pub fn fail_times(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// How many times `read_current` has been called.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }

    fn check_should_fail(&self) -> Result<()> {
        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::NotConnected);
        }
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl Sensor for MockSensor {
    fn address(&self) -> &str {
        &self.address
    }

    async fn read_current(&self) -> Result<SensorReading> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        Ok(*self.current_reading.read().await)
    }

    async fn read_battery(&self) -> Result<u8> {
        self.check_should_fail()?;
        Ok(*self.battery.read().await)
    }

    async fn get_history_info(&self) -> Result<HistoryInfo> {
        self.check_should_fail()?;
        let history = self.history.read().await;
        Ok(HistoryInfo {
            total_readings: history.len() as u16,
            interval_seconds: 300,
            seconds_since_update: 60,
        })
    }

    async fn download_history(&self, _options: HistoryOptions) -> Result<Vec<SensorReading>> {
        self.check_should_fail()?;
        Ok(self.history.read().await.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_reading() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        let reading = sensor.read_current().await.unwrap();
        assert_eq!(reading.co2, 800);
        assert_eq!(sensor.read_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_times_then_succeed() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        sensor.fail_times(2);

        assert!(sensor.read_current().await.is_err());
        assert!(sensor.read_current().await.is_err());
        assert!(sensor.read_current().await.is_ok());
        assert_eq!(sensor.read_count(), 3);
    }

    #[tokio::test]
    async fn test_should_fail_is_sticky() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        sensor.set_should_fail(true);

        assert!(sensor.read_current().await.is_err());
        assert!(sensor.read_battery().await.is_err());

        sensor.set_should_fail(false);
        assert!(sensor.read_current().await.is_ok());
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        let record = SensorReading {
            co2: 650,
            ..MockSensor::default_reading()
        };
        sensor.set_history(vec![record]).await;

        let info = sensor.get_history_info().await.unwrap();
        assert_eq!(info.total_readings, 1);

        let history = sensor.download_history(HistoryOptions::default()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].co2, 650);
    }
}

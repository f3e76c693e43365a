//! Sensor connection and communication.
//!
//! This module provides the main interface for connecting to and
//! communicating with an Aranet4 sensor over Bluetooth Low Energy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use airlog_types::SensorReading;
use airlog_types::uuids::{BATTERY_LEVEL, CURRENT_READINGS_DETAIL};

use crate::error::{Error, Result};
use crate::history::{HistoryInfo, HistoryOptions};
use crate::scan::{ScanOptions, find_device};
use crate::traits::Sensor;
use crate::util::{create_identifier, format_peripheral_id};

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE connection operations.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for BLE connection timeouts.
///
/// Increase the timeouts in challenging RF environments (concrete walls,
/// electromagnetic interference).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing a BLE connection.
    pub connection_timeout: Duration,
    /// Timeout for BLE read operations.
    pub read_timeout: Duration,
    /// Timeout for BLE write operations.
    pub write_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// A connected Aranet4 sensor.
///
/// # Note on Clone
///
/// This struct intentionally does not implement `Clone`. A `Device` represents
/// an active BLE connection with associated state. If you need to share one
/// across tasks, wrap it in `Arc<Device>`.
///
/// # Cleanup
///
/// Call [`Device::disconnect`] before dropping the device to release BLE
/// resources. Dropping without disconnecting logs a warning and performs
/// best-effort cleanup.
pub struct Device {
    /// Kept alive for the lifetime of the peripheral connection; the
    /// peripheral may hold internal references to the adapter.
    #[allow(dead_code)]
    adapter: Adapter,
    peripheral: Peripheral,
    name: Option<String>,
    /// Device address or identifier (MAC address on Linux/Windows, UUID on macOS).
    address: String,
    /// Cache of discovered characteristics by UUID for O(1) lookup.
    characteristics_cache: RwLock<HashMap<Uuid, Characteristic>>,
    /// Whether disconnect has been called (for Drop warning).
    disconnected: AtomicBool,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Connect to a sensor by name or MAC address.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect(identifier: &str) -> Result<Self> {
        Self::connect_with_config(identifier, ConnectionConfig::default()).await
    }

    /// Connect to a sensor with full timeout configuration.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect_with_config(identifier: &str, config: ConnectionConfig) -> Result<Self> {
        let options = ScanOptions {
            duration: config.connection_timeout,
            // Looking for a specific device, not just Aranet sensors.
            filter_aranet_only: false,
        };

        let (adapter, peripheral) = find_device(identifier, options).await?;
        Self::from_peripheral_with_config(adapter, peripheral, config).await
    }

    /// Create a Device from an already-discovered peripheral.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn from_peripheral(adapter: Adapter, peripheral: Peripheral) -> Result<Self> {
        Self::from_peripheral_with_config(adapter, peripheral, ConnectionConfig::default()).await
    }

    /// Create a Device from an already-discovered peripheral with full configuration.
    #[tracing::instrument(level = "info", skip_all, fields(connect_timeout = ?config.connection_timeout))]
    pub async fn from_peripheral_with_config(
        adapter: Adapter,
        peripheral: Peripheral,
        config: ConnectionConfig,
    ) -> Result<Self> {
        info!("Connecting to device...");
        timeout(config.connection_timeout, peripheral.connect())
            .await
            .map_err(|_| Error::Timeout {
                operation: "connect to device".to_string(),
                duration: config.connection_timeout,
            })??;
        info!("Connected!");

        info!("Discovering services...");
        timeout(config.discovery_timeout, peripheral.discover_services())
            .await
            .map_err(|_| Error::Timeout {
                operation: "discover services".to_string(),
                duration: config.discovery_timeout,
            })??;

        let services = peripheral.services();
        debug!("Found {} services", services.len());

        // Build characteristics cache for O(1) lookups
        let mut characteristics_cache = HashMap::new();
        for service in &services {
            debug!("  Service: {}", service.uuid);
            for char in &service.characteristics {
                debug!("    Characteristic: {}", char.uuid);
                characteristics_cache.insert(char.uuid, char.clone());
            }
        }
        debug!(
            "Cached {} characteristics for fast lookup",
            characteristics_cache.len()
        );

        let properties = peripheral.properties().await?;
        let name = properties.as_ref().and_then(|p| p.local_name.clone());

        // On macOS the address may be 00:00:00:00:00:00, so fall back to the
        // peripheral ID.
        let address = properties
            .as_ref()
            .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
            .unwrap_or_else(|| format_peripheral_id(&peripheral.id()));

        Ok(Self {
            adapter,
            peripheral,
            name,
            address,
            characteristics_cache: RwLock::new(characteristics_cache),
            disconnected: AtomicBool::new(false),
            config,
        })
    }

    /// Check if the device is connected (queries BLE stack state).
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Disconnect from the device.
    #[tracing::instrument(level = "info", skip(self), fields(device_name = ?self.name))]
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.disconnected.store(true, Ordering::SeqCst);
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the device address or identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Find a characteristic by UUID using the cached lookup table.
    async fn find_characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        let cache = self.characteristics_cache.read().await;
        if let Some(char) = cache.get(&uuid) {
            return Ok(char.clone());
        }

        Err(Error::characteristic_not_found(
            uuid.to_string(),
            self.peripheral.services().len(),
        ))
    }

    /// Read a characteristic value by UUID.
    ///
    /// Includes a timeout to prevent indefinite hangs on BLE operations,
    /// controlled by [`ConnectionConfig::read_timeout`].
    pub async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let characteristic = self.find_characteristic(uuid).await?;
        let data = timeout(
            self.config.read_timeout,
            self.peripheral.read(&characteristic),
        )
        .await
        .map_err(|_| Error::Timeout {
            operation: format!("read characteristic {}", uuid),
            duration: self.config.read_timeout,
        })??;
        Ok(data)
    }

    /// Write a value to a characteristic.
    pub async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<()> {
        let characteristic = self.find_characteristic(uuid).await?;
        timeout(
            self.config.write_timeout,
            self.peripheral
                .write(&characteristic, data, WriteType::WithResponse),
        )
        .await
        .map_err(|_| Error::Timeout {
            operation: format!("write characteristic {}", uuid),
            duration: self.config.write_timeout,
        })??;
        Ok(())
    }

    /// Read the current sensor measurements.
    ///
    /// Reads the detailed readings characteristic and stamps the result with
    /// `now - age` as the measurement time.
    #[tracing::instrument(level = "debug", skip(self), fields(device_name = ?self.name))]
    pub async fn read_current(&self) -> Result<SensorReading> {
        let data = self.read_characteristic(CURRENT_READINGS_DETAIL).await?;
        let reading = SensorReading::from_bytes(&data)?
            .with_timestamp_from(time::OffsetDateTime::now_utc());
        Ok(reading)
    }

    /// Read the battery level (0-100).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn read_battery(&self) -> Result<u8> {
        let data = self.read_characteristic(BATTERY_LEVEL).await?;
        if data.is_empty() {
            return Err(Error::InvalidData("Empty battery data".to_string()));
        }
        Ok(data[0])
    }
}

// NOTE: Drop performs best-effort cleanup if disconnect() was not called.
// The cleanup is spawned as a background task and may not complete during
// shutdown. Callers SHOULD explicitly call `device.disconnect().await`.

impl Drop for Device {
    fn drop(&mut self) {
        if !self.disconnected.load(Ordering::SeqCst) {
            self.disconnected.store(true, Ordering::SeqCst);

            warn!(
                device_name = ?self.name,
                device_address = %self.address,
                "Device dropped without calling disconnect() - performing best-effort cleanup"
            );

            let peripheral = self.peripheral.clone();
            let address = self.address.clone();

            // May fail if the runtime is shutting down; cleanup is best-effort.
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = peripheral.disconnect().await {
                        debug!(
                            device_address = %address,
                            error = %e,
                            "Best-effort disconnect failed (device may already be disconnected)"
                        );
                    }
                });
            }
        }
    }
}

#[async_trait]
impl Sensor for Device {
    fn address(&self) -> &str {
        Device::address(self)
    }

    async fn read_current(&self) -> Result<SensorReading> {
        Device::read_current(self).await
    }

    async fn read_battery(&self) -> Result<u8> {
        Device::read_battery(self).await
    }

    async fn get_history_info(&self) -> Result<HistoryInfo> {
        Device::get_history_info(self).await
    }

    async fn download_history(&self, options: HistoryOptions) -> Result<Vec<SensorReading>> {
        Device::download_history(self, options).await
    }

    async fn disconnect(&self) -> Result<()> {
        Device::disconnect(self).await
    }
}

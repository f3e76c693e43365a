//! Historical data download from device memory.
//!
//! The sensor stores one record per measurement interval, per parameter.
//! Download works over the V2 read-based protocol: write a request frame to
//! the command characteristic naming a parameter and a 1-based start index,
//! then read chunks back from the history characteristic until the device
//! reports no more data. Records are assembled column-wise (CO2, then
//! temperature, pressure, humidity) and timestamps are back-calculated from
//! the measurement interval and the age of the newest reading.

use std::collections::BTreeMap;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use airlog_types::{SensorReading, Status};
use airlog_types::uuids::{COMMAND, HISTORY_V2, READ_INTERVAL, SECONDS_SINCE_UPDATE, TOTAL_READINGS};

use crate::device::Device;
use crate::error::{Error, Result};

/// History V2 request command (read-based protocol).
/// Format: `[HISTORY_V2_REQUEST, param, start_lo, start_hi]`
pub const HISTORY_V2_REQUEST: u8 = 0x61;

/// Parameter identifiers for history downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HistoryParam {
    /// Temperature (raw u16, divide by 20 for Celsius).
    Temperature = 1,
    /// Relative humidity (u8 on the wire, padded to u16 here).
    Humidity = 2,
    /// Pressure (raw u16, divide by 10 for hPa).
    Pressure = 3,
    /// CO2 concentration in ppm.
    Co2 = 4,
}

/// Information about the history stored on the device.
#[derive(Debug, Clone, Copy)]
pub struct HistoryInfo {
    /// Number of readings stored in device memory.
    pub total_readings: u16,
    /// Measurement interval in seconds.
    pub interval_seconds: u16,
    /// Seconds since the most recent measurement.
    pub seconds_since_update: u16,
}

/// Options for a history download.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// First record to download, 1-based. Defaults to 1 (oldest).
    pub start_index: Option<u16>,
    /// Last record to download, 1-based inclusive. Defaults to the newest.
    pub end_index: Option<u16>,
    /// Delay between the command write and each chunk read. The device needs
    /// a moment to stage data.
    pub read_delay: Duration,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            start_index: None,
            end_index: None,
            read_delay: Duration::from_millis(50),
        }
    }
}

fn raw_to_temperature(raw: u16) -> f32 {
    f32::from(raw) / 20.0
}

fn raw_to_pressure(raw: u16) -> f32 {
    f32::from(raw) / 10.0
}

/// Assemble per-parameter columns into records with back-calculated timestamps.
///
/// The newest record sits at the end of each column and was measured
/// `seconds_since_update` ago; each earlier record is one `interval` further
/// back.
fn assemble_records(
    co2: &[u16],
    temperature: &[u16],
    pressure: &[u16],
    humidity: &[u16],
    info: &HistoryInfo,
    now: OffsetDateTime,
) -> Vec<SensorReading> {
    let latest = now - time::Duration::seconds(i64::from(info.seconds_since_update));
    let count = co2.len();

    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let readings_ago = (count - 1 - i) as i64;
        let timestamp = latest - time::Duration::seconds(readings_ago * i64::from(info.interval_seconds));

        records.push(SensorReading {
            co2: co2.get(i).copied().unwrap_or(0),
            temperature: raw_to_temperature(temperature.get(i).copied().unwrap_or(0)),
            pressure: raw_to_pressure(pressure.get(i).copied().unwrap_or(0)),
            humidity: humidity.get(i).copied().unwrap_or(0).min(100) as u8,
            // History carries no per-record battery level.
            battery: 0,
            status: Status::Error,
            interval: info.interval_seconds,
            age: 0,
            timestamp: Some(timestamp),
        });
    }
    records
}

impl Device {
    /// Read history metadata: record count, interval, and age of the newest
    /// reading.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_history_info(&self) -> Result<HistoryInfo> {
        let total = self.read_characteristic(TOTAL_READINGS).await?;
        let interval = self.read_characteristic(READ_INTERVAL).await?;
        let since = self.read_characteristic(SECONDS_SINCE_UPDATE).await?;

        let parse_u16 = |data: &[u8], what: &str| -> Result<u16> {
            if data.len() < 2 {
                return Err(Error::InvalidData(format!(
                    "{} response too short: {} bytes",
                    what,
                    data.len()
                )));
            }
            Ok(u16::from_le_bytes([data[0], data[1]]))
        };

        Ok(HistoryInfo {
            total_readings: parse_u16(&total, "total readings")?,
            interval_seconds: parse_u16(&interval, "interval")?,
            seconds_since_update: parse_u16(&since, "seconds since update")?,
        })
    }

    /// Download historical readings.
    ///
    /// Downloads CO2, temperature, pressure, and humidity columns in turn and
    /// assembles them into timestamped [`SensorReading`]s, oldest first.
    #[tracing::instrument(level = "info", skip(self, options))]
    pub async fn download_history(&self, options: HistoryOptions) -> Result<Vec<SensorReading>> {
        let info = self.get_history_info().await?;
        info!(
            "Device has {} readings at {}s interval",
            info.total_readings, info.interval_seconds
        );

        if info.total_readings == 0 {
            return Ok(Vec::new());
        }

        let start_idx = options.start_index.unwrap_or(1).max(1);
        let end_idx = options
            .end_index
            .unwrap_or(info.total_readings)
            .min(info.total_readings);

        if start_idx > end_idx {
            return Err(Error::InvalidData(format!(
                "invalid history range: {}..{}",
                start_idx, end_idx
            )));
        }

        let co2 = self
            .download_param(HistoryParam::Co2, start_idx, end_idx, options.read_delay)
            .await?;
        let temperature = self
            .download_param(
                HistoryParam::Temperature,
                start_idx,
                end_idx,
                options.read_delay,
            )
            .await?;
        let pressure = self
            .download_param(
                HistoryParam::Pressure,
                start_idx,
                end_idx,
                options.read_delay,
            )
            .await?;
        let humidity = self
            .download_param(
                HistoryParam::Humidity,
                start_idx,
                end_idx,
                options.read_delay,
            )
            .await?;

        let records = assemble_records(
            &co2,
            &temperature,
            &pressure,
            &humidity,
            &info,
            OffsetDateTime::now_utc(),
        );

        info!("Downloaded {} history records", records.len());
        Ok(records)
    }

    /// Download one parameter's history column over the V2 protocol.
    async fn download_param(
        &self,
        param: HistoryParam,
        start_idx: u16,
        end_idx: u16,
        read_delay: Duration,
    ) -> Result<Vec<u16>> {
        debug!(
            "Downloading {:?} history from {} to {}",
            param, start_idx, end_idx
        );

        // Humidity is 1 byte per value on the wire; everything else is 2.
        let value_size = match param {
            HistoryParam::Humidity => 1,
            _ => 2,
        };

        let mut values: BTreeMap<u16, u16> = BTreeMap::new();
        let mut current_idx = start_idx;

        while current_idx <= end_idx {
            let cmd = [
                HISTORY_V2_REQUEST,
                param as u8,
                (current_idx & 0xFF) as u8,
                ((current_idx >> 8) & 0xFF) as u8,
            ];

            self.write_characteristic(COMMAND, &cmd).await?;
            sleep(read_delay).await;

            let response = self.read_characteristic(HISTORY_V2).await?;

            // V2 response format (10-byte header):
            // Byte 0: param
            // Bytes 1-2: interval (u16 LE)
            // Bytes 3-4: total_readings (u16 LE)
            // Bytes 5-6: ago (u16 LE)
            // Bytes 7-8: start index (u16 LE)
            // Byte 9: count
            // Bytes 10+: data values
            if response.len() < 10 {
                warn!(
                    "Invalid history response: too short ({} bytes)",
                    response.len()
                );
                break;
            }

            let resp_param = response[0];
            if resp_param != param as u8 {
                warn!("Unexpected parameter in response: {}", resp_param);
                // Device may not have processed the command yet.
                sleep(read_delay).await;
                continue;
            }

            let resp_start = u16::from_le_bytes([response[7], response[8]]);
            let resp_count = response[9] as usize;

            debug!(
                "History response: param={}, start={}, count={}",
                resp_param, resp_start, resp_count
            );

            if resp_count == 0 {
                debug!("Reached end of history (count=0)");
                break;
            }

            let data = &response[10..];
            let num_values = (data.len() / value_size).min(resp_count);

            for i in 0..num_values {
                let idx = resp_start + i as u16;
                if idx > end_idx {
                    break;
                }
                let value = match value_size {
                    1 => u16::from(data[i]),
                    _ => u16::from_le_bytes([data[i * 2], data[i * 2 + 1]]),
                };
                values.insert(idx, value);
            }

            current_idx = resp_start + num_values as u16;
            debug!(
                "Downloaded {} values, next index: {}",
                num_values, current_idx
            );

            if (resp_start as usize + resp_count) >= end_idx as usize {
                debug!("Reached end of requested range");
                break;
            }
        }

        Ok(values.into_values().collect())
    }
}

//! Exploratory scanners for the Eve Room HomeKit accessory.
//!
//! Everything in this module is reverse-engineering scaffolding. Eve does not
//! document its BLE payloads; the byte offsets decoded here are guesses made
//! while watching live advertisements, logged so a human can look for
//! patterns. None of the decoded values are a wire contract and none of them
//! feed the logging pipeline.

use std::time::Duration;

use btleplug::api::{Central, CentralEvent, CharPropFlags, Peripheral as _, ScanFilter};
use btleplug::platform::Peripheral;
use futures::StreamExt;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{info, warn};

use airlog_types::uuids::APPLE_MANUFACTURER_ID;

use crate::error::Result;
use crate::scan::{ScanOptions, find_device, get_adapter};
use crate::util::hex_dump;

/// One speculative interpretation of a manufacturer-data payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeculativeField {
    /// Byte offset the value was sliced from.
    pub offset: usize,
    /// The u16 little-endian value at that offset.
    pub value: u16,
}

/// Slice u16 LE values at every even offset in the first 16 bytes.
///
/// Pure guesswork: the output is for a human comparing payloads against the
/// readings shown in the Eve app, nothing more.
pub fn speculative_u16_fields(data: &[u8]) -> Vec<SpeculativeField> {
    let mut fields = Vec::new();
    let limit = data.len().saturating_sub(1).min(16);
    let mut i = 0;
    while i < limit {
        let value = u16::from_le_bytes([data[i], data[i + 1]]);
        fields.push(SpeculativeField { offset: i, value });
        i += 2;
    }
    fields
}

/// Guess a temperature/humidity pair from a payload.
///
/// Tries bytes 6-7 as i16 LE hundredths of a degree and bytes 8-9 as u16 LE
/// hundredths of a percent, and keeps the pair only if both land in sane
/// ranges. Observed to line up with the Eve app sometimes, not always.
pub fn guess_temp_humidity(data: &[u8]) -> Option<(f32, f32)> {
    if data.len() < 10 {
        return None;
    }
    let temp_raw = i16::from_le_bytes([data[6], data[7]]);
    let humi_raw = u16::from_le_bytes([data[8], data[9]]);

    let temp_c = f32::from(temp_raw) / 100.0;
    let humidity = f32::from(humi_raw) / 100.0;

    if (-40.0..=80.0).contains(&temp_c) && (0.0..=100.0).contains(&humidity) {
        Some((temp_c, humidity))
    } else {
        None
    }
}

/// Monitor BLE advertisements for Eve manufacturer data.
///
/// Listens to adapter events for `duration` (the scripts historically ran
/// 30 s to catch several advertisement cycles), filters to Apple's company
/// ID, and logs a hex dump plus speculative decodes of each payload. If
/// `target` is set, only advertisements from a matching address or name are
/// shown.
pub async fn watch_advertisements(target: Option<&str>, duration: Duration) -> Result<()> {
    let adapter = get_adapter().await?;
    let mut events = adapter.events().await?;

    info!(
        "Monitoring advertisements for {}s (experimental decode)...",
        duration.as_secs()
    );
    adapter.start_scan(ScanFilter::default()).await?;

    let target_lower = target.map(str::to_lowercase);

    let monitor = async {
        while let Some(event) = events.next().await {
            let CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } = event
            else {
                continue;
            };

            let Some(data) = manufacturer_data.get(&APPLE_MANUFACTURER_ID) else {
                continue;
            };

            // Resolve a name/address for filtering and display.
            let (name, address) = match adapter.peripheral(&id).await {
                Ok(p) => match p.properties().await {
                    Ok(Some(props)) => (props.local_name, props.address.to_string()),
                    _ => (None, String::new()),
                },
                Err(_) => (None, String::new()),
            };

            if let Some(ref t) = target_lower {
                let name_match = name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(t));
                let addr_match = address.to_lowercase() == *t;
                if !name_match && !addr_match {
                    continue;
                }
            } else if !name.as_deref().is_some_and(|n| n.contains("Eve")) {
                // Without a target, Apple manufacturer data is far too common
                // to dump unfiltered.
                continue;
            }

            info!(
                "[{}] advertisement from {} ({})",
                OffsetDateTime::now_utc(),
                name.as_deref().unwrap_or("<unnamed>"),
                address
            );
            info!("  raw Apple data: {}", hex_dump(data));

            for field in speculative_u16_fields(data) {
                info!(
                    "  guess: offset {} as u16 = {} (0x{:04x})",
                    field.offset, field.value, field.value
                );
            }

            if let Some((temp_c, humidity)) = guess_temp_humidity(data) {
                info!(
                    "  guess: temperature {:.1}°C, humidity {:.1}% (offsets 6-9, unverified)",
                    temp_c, humidity
                );
            }
        }
    };

    // The event stream never ends on its own; the fixed wall-clock window is
    // the only cancellation.
    let _ = timeout(duration, monitor).await;

    adapter.stop_scan().await?;
    info!("Monitoring complete");
    Ok(())
}

/// Connect to a device and dump every GATT service and characteristic.
///
/// Reads each readable characteristic and logs hex plus opportunistic
/// interpretations (u16 LE, f32 LE, UTF-8). HomeKit-paired accessories
/// reject most reads; that is logged, not fatal.
pub async fn dump_gatt(identifier: &str, scan_duration: Duration) -> Result<()> {
    let options = ScanOptions {
        duration: scan_duration,
        filter_aranet_only: false,
    };
    let (_adapter, peripheral) = find_device(identifier, options).await?;

    info!("Connecting to {}...", identifier);
    peripheral.connect().await?;
    peripheral.discover_services().await?;

    info!("Discovered services and characteristics:");
    for service in peripheral.services() {
        info!("Service: {}", service.uuid);
        for characteristic in &service.characteristics {
            info!("  Characteristic: {}", characteristic.uuid);
            info!("    Properties: {:?}", characteristic.properties);

            if characteristic.properties.contains(CharPropFlags::READ) {
                dump_characteristic_value(&peripheral, characteristic).await;
            }
        }
    }

    peripheral.disconnect().await?;
    Ok(())
}

async fn dump_characteristic_value(
    peripheral: &Peripheral,
    characteristic: &btleplug::api::Characteristic,
) {
    match peripheral.read(characteristic).await {
        Ok(value) => {
            info!("    Value (hex): {}", hex_dump(&value));

            if let Ok(text) = std::str::from_utf8(&value) {
                if !text.is_empty() && text.chars().all(|c| !c.is_control()) {
                    info!("    Value (text): {}", text);
                }
            }

            if value.len() == 2 {
                info!(
                    "    Value (uint16): {}",
                    u16::from_le_bytes([value[0], value[1]])
                );
            } else if value.len() == 4 {
                info!(
                    "    Value (float): {}",
                    f32::from_le_bytes([value[0], value[1], value[2], value[3]])
                );
            }
        }
        Err(e) => {
            // HomeKit-paired characteristics commonly refuse reads.
            warn!("    Could not read: {}", e);
        }
    }
}

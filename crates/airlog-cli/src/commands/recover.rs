//! Recover command: backfill InfluxDB from the sensor's stored history.
//!
//! The Aranet4 keeps a few days of measurements on-device, so an outage of
//! the logging host loses nothing as long as this runs before the ring
//! buffer wraps. Records that fail the plausibility check are skipped and
//! counted, never fatal.

use anyhow::{Context, Result};
use time::OffsetDateTime;
use tracing::{info, warn};

use airlog_core::{Device, HistoryOptions, ReadingValidator, with_retry};
use airlog_store::{InfluxClient, MeasurementRecord};

use crate::cli::{InfluxArgs, RetryArgs, TagArgs};
use crate::cycle::write_batch;

pub async fn cmd_recover(
    mac: &str,
    since_hours: Option<u64>,
    influx: &InfluxArgs,
    tags: &TagArgs,
    retry: &RetryArgs,
) -> Result<()> {
    let policy = retry.to_policy();
    let client = InfluxClient::new(influx.to_config())?;
    let record_tags = tags.to_tags(mac);
    let validator = ReadingValidator::default();

    let device = with_retry(&policy, "connect", || Device::connect(mac))
        .await
        .with_context(|| format!("Failed to connect to {mac}"))?;

    let result = async {
        let history_info = device
            .get_history_info()
            .await
            .context("Failed to read history metadata")?;
        info!(
            "Device holds {} record(s) at a {}s interval",
            history_info.total_readings, history_info.interval_seconds
        );

        with_retry(&policy, "download history", || {
            device.download_history(HistoryOptions::default())
        })
        .await
        .context("Failed to download history")
    }
    .await;

    // History records carry no battery level; read it live once and stamp
    // every backfilled point with it (or omit the field if the read fails).
    let battery = device.read_battery().await.ok();
    device.disconnect().await.ok();
    let history = result?;

    let cutoff = since_hours
        .map(|hours| OffsetDateTime::now_utc() - time::Duration::hours(hours as i64));
    let now = OffsetDateTime::now_utc();

    let mut records = Vec::with_capacity(history.len());
    let mut skipped = 0usize;

    for reading in &history {
        if let Some(cutoff) = cutoff {
            if reading.timestamp.is_some_and(|t| t < cutoff) {
                continue;
            }
        }
        if let Err(failure) = validator.validate(reading) {
            warn!("Skipping implausible history record: {}", failure);
            skipped += 1;
            continue;
        }
        records.push(
            MeasurementRecord::from_reading(reading, record_tags.clone(), now)
                .with_battery(battery.map(i64::from)),
        );
    }

    if records.is_empty() {
        info!("Nothing to backfill ({} record(s) skipped)", skipped);
        return Ok(());
    }

    write_batch(&client, &records, &policy)
        .await
        .context("Failed to write history batch")?;

    info!(
        "Backfilled {} record(s), skipped {}",
        records.len(),
        skipped
    );
    Ok(())
}

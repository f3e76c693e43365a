//! Log command: one read-validate-write cycle.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use airlog_core::{Device, ReadingValidator, with_retry};
use airlog_store::InfluxClient;
use airlog_types::units::celsius_to_fahrenheit;

use crate::cli::{InfluxArgs, RetryArgs, TagArgs};
use crate::cycle::run_cycle;

pub async fn cmd_log(mac: &str, influx: &InfluxArgs, tags: &TagArgs, retry: &RetryArgs) -> Result<()> {
    let started = Instant::now();
    let policy = retry.to_policy();
    let client = InfluxClient::new(influx.to_config())?;
    let record_tags = tags.to_tags(mac);
    let validator = ReadingValidator::default();

    let device = with_retry(&policy, "connect", || Device::connect(mac))
        .await
        .with_context(|| format!("Failed to connect to {mac}"))?;

    let result = run_cycle(&device, &client, &validator, &record_tags, &policy).await;
    device.disconnect().await.ok();

    let reading = result.context("Logging cycle failed")?;
    info!(
        "CO2 {} ppm, {:.1}°C ({:.1}°F), {}% RH, {:.1} hPa, battery {}%, took {:.1}s",
        reading.co2,
        reading.temperature,
        celsius_to_fahrenheit(reading.temperature),
        reading.humidity,
        reading.pressure,
        reading.battery,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

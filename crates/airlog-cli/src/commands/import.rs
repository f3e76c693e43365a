//! Import command: load a CSV export from the mobile app into InfluxDB.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use airlog_store::{InfluxClient, import_csv};

use crate::cli::{InfluxArgs, RetryArgs, TagArgs};
use crate::cycle::write_batch;

pub async fn cmd_import(
    path: &Path,
    mac: &str,
    influx: &InfluxArgs,
    tags: &TagArgs,
    retry: &RetryArgs,
) -> Result<()> {
    let policy = retry.to_policy();
    let client = InfluxClient::new(influx.to_config())?;
    let record_tags = tags.to_tags(mac);

    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let summary = import_csv(file).context("Failed to read CSV")?;

    if summary.readings.is_empty() {
        info!(
            "No usable rows in {} ({} skipped)",
            path.display(),
            summary.skipped
        );
        return Ok(());
    }

    let records: Vec<_> = summary
        .readings
        .into_iter()
        .map(|reading| reading.into_record(record_tags.clone()))
        .collect();

    write_batch(&client, &records, &policy)
        .await
        .context("Failed to write imported records")?;

    info!(
        "Imported {} record(s) from {}, skipped {} row(s)",
        records.len(),
        path.display(),
        summary.skipped
    );
    Ok(())
}

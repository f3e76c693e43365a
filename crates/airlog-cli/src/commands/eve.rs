//! Eve command: experimental Eve Room exploration.

use std::time::Duration;

use anyhow::{Context, Result};

use airlog_core::explore;

use crate::cli::EveAction;

pub async fn cmd_eve(action: EveAction) -> Result<()> {
    match action {
        EveAction::Watch { target, duration } => {
            explore::watch_advertisements(target.as_deref(), Duration::from_secs(duration))
                .await
                .context("Advertisement watch failed")?;
        }
        EveAction::Dump {
            device,
            scan_duration,
        } => {
            explore::dump_gatt(&device, Duration::from_secs(scan_duration))
                .await
                .with_context(|| format!("GATT dump of {device} failed"))?;
        }
    }
    Ok(())
}

//! InfluxDB v2 write client.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::line::encode_batch;
use crate::record::MeasurementRecord;

/// Configuration for the InfluxDB connection.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`.
    pub url: String,
    /// API token sent as `Authorization: Token ...`.
    pub token: String,
    /// Organization name.
    pub org: String,
    /// Destination bucket.
    pub bucket: String,
}

/// Client for writing measurement records to InfluxDB v2.
///
/// # Example
///
/// ```no_run
/// use airlog_store::{InfluxClient, InfluxConfig};
///
/// # async fn example() -> airlog_store::Result<()> {
/// let client = InfluxClient::new(InfluxConfig {
///     url: "http://localhost:8086".to_string(),
///     token: "my-token".to_string(),
///     org: "home".to_string(),
///     bucket: "sensors".to_string(),
/// })?;
/// client.write(&[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct InfluxClient {
    config: InfluxConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("url", &self.config.url)
            .field("org", &self.config.org)
            .field("bucket", &self.config.bucket)
            .finish_non_exhaustive()
    }
}

impl InfluxClient {
    /// Create a client with a 30-second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: InfluxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { config, client })
    }

    /// URL of the v2 write endpoint, with second-precision timestamps.
    fn write_url(&self) -> String {
        format!(
            "{}/api/v2/write?org={}&bucket={}&precision=s",
            self.config.url.trim_end_matches('/'),
            self.config.org,
            self.config.bucket
        )
    }

    /// Write a batch of records.
    ///
    /// An empty batch is a no-op. The whole batch goes in one request; on a
    /// non-success status the response body is surfaced in the error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] on transport failure or
    /// [`StoreError::Response`] when InfluxDB rejects the write.
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub async fn write(&self, records: &[MeasurementRecord]) -> Result<()> {
        if records.is_empty() {
            debug!("No records to write, skipping");
            return Ok(());
        }

        let body = encode_batch(records);
        debug!("Writing {} line(s) to {}", records.len(), self.config.bucket);

        let response = self
            .client
            .post(self.write_url())
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Response {
                status: status.as_u16(),
                body,
            });
        }

        info!("Wrote {} record(s) to bucket {}", records.len(), self.config.bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InfluxConfig {
        InfluxConfig {
            url: "http://localhost:8086".to_string(),
            token: "secret".to_string(),
            org: "home".to_string(),
            bucket: "sensors".to_string(),
        }
    }

    #[test]
    fn test_write_url() {
        let client = InfluxClient::new(config()).unwrap();
        assert_eq!(
            client.write_url(),
            "http://localhost:8086/api/v2/write?org=home&bucket=sensors&precision=s"
        );
    }

    #[test]
    fn test_write_url_strips_trailing_slash() {
        let mut cfg = config();
        cfg.url = "http://localhost:8086/".to_string();
        let client = InfluxClient::new(cfg).unwrap();
        assert!(!client.write_url().contains("//api"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        // Points at nothing; must not touch the network for zero records.
        let client = InfluxClient::new(config()).unwrap();
        assert!(client.write(&[]).await.is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = InfluxClient::new(config()).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
    }
}

//! Persistence layer for Aranet4 sensor readings.
//!
//! Readings become [`MeasurementRecord`]s, are encoded as InfluxDB line
//! protocol, and are written through [`InfluxClient`]. The [`import`] module
//! handles CSV files exported from the mobile app.
//!
//! # Example
//!
//! ```no_run
//! use airlog_store::{InfluxClient, InfluxConfig, MeasurementRecord, RecordTags};
//! use airlog_types::SensorReading;
//! use time::OffsetDateTime;
//!
//! # async fn example(reading: SensorReading) -> airlog_store::Result<()> {
//! let client = InfluxClient::new(InfluxConfig {
//!     url: "http://localhost:8086".to_string(),
//!     token: std::env::var("INFLUXDB_TOKEN").unwrap(),
//!     org: "home".to_string(),
//!     bucket: "sensors".to_string(),
//! })?;
//!
//! let tags = RecordTags {
//!     device: "aranet4".to_string(),
//!     location: "office".to_string(),
//!     mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
//! };
//! let record = MeasurementRecord::from_reading(&reading, tags, OffsetDateTime::now_utc());
//! client.write(&[record]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod import;
pub mod line;
pub mod record;

pub use client::{InfluxClient, InfluxConfig};
pub use error::{Result, RowError, StoreError};
pub use import::{import_csv, ImportSummary, ImportedReading};
pub use record::{MeasurementRecord, RecordTags, MEASUREMENT};

//! The read-validate-write logging cycle.
//!
//! One invocation of `airlog log` runs exactly one cycle: read the current
//! values, check they are plausible, write one record to the store. The read
//! step and the write step each run under the same retry policy; an
//! implausible reading counts as a transient read failure, because a re-read
//! over BLE usually comes back clean.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;

use airlog_core::retry::Retryable;
use airlog_core::{ReadingValidator, RetryPolicy, Sensor, with_retry};
use airlog_store::{InfluxClient, MeasurementRecord, RecordTags, StoreError};
use airlog_types::SensorReading;

/// Destination for measurement records.
///
/// [`InfluxClient`] is the production implementation; tests substitute a
/// recording sink.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write(&self, records: &[MeasurementRecord]) -> Result<(), StoreError>;
}

#[async_trait]
impl RecordSink for InfluxClient {
    async fn write(&self, records: &[MeasurementRecord]) -> Result<(), StoreError> {
        InfluxClient::write(self, records).await
    }
}

/// Error from a logging cycle: either side of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Sensor(#[from] airlog_core::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Retryable for CycleError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Sensor(e) => e.is_retryable(),
            // Transport failures are worth another attempt; a 4xx rejection
            // will not change on retry.
            Self::Store(StoreError::Http(_) | StoreError::Io(_)) => true,
            Self::Store(StoreError::Response { status, .. }) => *status >= 500,
            // Csv, and any future variants: `StoreError` is non-exhaustive.
            Self::Store(_) => false,
        }
    }
}

/// Read a validated reading from the sensor under the retry policy.
///
/// A reading that fails the plausibility check is treated as a failed read
/// and retried like a transport error.
///
/// # Errors
///
/// Returns the last error once the retry bound is exhausted, or the first
/// non-retryable error.
pub async fn acquire_reading(
    sensor: &dyn Sensor,
    validator: &ReadingValidator,
    policy: &RetryPolicy,
) -> Result<SensorReading, airlog_core::Error> {
    with_retry(policy, "read sensor", || async {
        let reading = sensor.read_current().await?;
        validator
            .validate(&reading)
            .map_err(|failure| airlog_core::Error::implausible(failure.to_string()))?;
        Ok(reading)
    })
    .await
}

/// Write one record to the store under the retry policy.
pub async fn persist_reading(
    sink: &dyn RecordSink,
    record: MeasurementRecord,
    policy: &RetryPolicy,
) -> Result<(), CycleError> {
    with_retry(policy, "write record", || async {
        sink.write(std::slice::from_ref(&record))
            .await
            .map_err(CycleError::from)
    })
    .await
}

/// Run one logging cycle: acquire, convert, persist.
///
/// Returns the reading that was written.
pub async fn run_cycle(
    sensor: &dyn Sensor,
    sink: &dyn RecordSink,
    validator: &ReadingValidator,
    tags: &RecordTags,
    policy: &RetryPolicy,
) -> Result<SensorReading, CycleError> {
    let reading = acquire_reading(sensor, validator, policy).await?;

    let record = MeasurementRecord::from_reading(&reading, tags.clone(), OffsetDateTime::now_utc());
    persist_reading(sink, record, policy).await?;

    info!("Logged reading: {}", reading);
    Ok(reading)
}

/// Write a pre-built batch of records under the retry policy.
///
/// Used by the backfill paths (history recovery, CSV import), where the
/// records already exist and only the write can fail.
pub async fn write_batch(
    sink: &dyn RecordSink,
    records: &[MeasurementRecord],
    policy: &RetryPolicy,
) -> Result<(), CycleError> {
    with_retry(policy, "batch write", || async {
        sink.write(records).await.map_err(CycleError::from)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use airlog_core::MockSensor;

    /// Records every write; can fail the first N writes with a given status.
    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<MeasurementRecord>>,
        remaining_failures: AtomicU32,
        failure_status: AtomicU32,
    }

    impl RecordingSink {
        fn fail_times(&self, count: u32, status: u16) {
            self.remaining_failures.store(count, Ordering::Relaxed);
            self.failure_status.store(u32::from(status), Ordering::Relaxed);
        }

        fn written(&self) -> Vec<MeasurementRecord> {
            self.written.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn write(&self, records: &[MeasurementRecord]) -> Result<(), StoreError> {
            if self.remaining_failures.load(Ordering::Relaxed) > 0 {
                self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
                return Err(StoreError::Response {
                    status: self.failure_status.load(Ordering::Relaxed) as u16,
                    body: "injected failure".to_string(),
                });
            }
            self.written.lock().unwrap().extend_from_slice(records);
            Ok(())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    fn tags() -> RecordTags {
        RecordTags {
            device: "aranet4".into(),
            location: "office".into(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
        }
    }

    #[tokio::test]
    async fn test_cycle_writes_converted_record() {
        // The mock's default reading is 22.5°C; the stored field must be
        // the Fahrenheit conversion, 72.5.
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        let sink = RecordingSink::default();

        let reading = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await
        .unwrap();

        assert_eq!(reading.co2, 800);

        let written = sink.written();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].co2, 800);
        assert!((written[0].temperature_f - 72.5).abs() < 0.001);
        assert_eq!(written[0].tags.location, "office");
    }

    #[tokio::test]
    async fn test_cycle_retries_sensor_failures() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        sensor.fail_times(2);
        let sink = RecordingSink::default();

        let result = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await;

        assert!(result.is_ok());
        // Two failed reads, then the one that stuck.
        assert_eq!(sensor.read_count(), 3);
        assert_eq!(sink.written().len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_stops_at_attempt_bound() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        sensor.fail_times(10);
        let sink = RecordingSink::default();

        let result = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(sensor.read_count(), 3);
        assert!(sink.written().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_rejects_implausible_reading() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        sensor
            .set_reading(SensorReading {
                co2: 0,
                ..SensorReading::default()
            })
            .await;
        let sink = RecordingSink::default();

        let result = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await;

        assert!(result.is_err());
        // Implausible readings are retried; nothing must reach the store.
        assert_eq!(sensor.read_count(), 3);
        assert!(sink.written().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_retries_server_errors() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        let sink = RecordingSink::default();
        sink.fail_times(1, 503);

        let result = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(sink.written().len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_does_not_retry_client_errors() {
        let sensor = MockSensor::new("AA:BB:CC:DD:EE:FF");
        let sink = RecordingSink::default();
        sink.fail_times(10, 401);

        let result = run_cycle(
            &sensor,
            &sink,
            &ReadingValidator::default(),
            &tags(),
            &fast_policy(3),
        )
        .await;

        assert!(result.is_err());
        // A bad token is not transient; one read, one write attempt.
        assert_eq!(sensor.read_count(), 1);
    }

    #[tokio::test]
    async fn test_write_batch_retries() {
        let sink = RecordingSink::default();
        sink.fail_times(2, 500);

        let record = MeasurementRecord {
            tags: tags(),
            co2: 650,
            temperature_f: 70.0,
            humidity: 45,
            pressure: 1013.2,
            battery: Some(90),
            timestamp: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        };

        write_batch(&sink, &[record], &fast_policy(3)).await.unwrap();
        assert_eq!(sink.written().len(), 1);
    }
}

//! Error types for airlog-store.

/// Result type for airlog-store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur when persisting or importing readings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// HTTP transport error talking to the store.
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store returned error {status}: {body}")]
    Response { status: u16, body: String },

    /// CSV reader error (file-level, aborts the import).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single malformed or implausible import row.
///
/// Row errors are logged and skipped by the batch paths; they never abort
/// the batch, which is why they are a separate type from [`StoreError`].
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// The row did not have the expected number of columns.
    #[error("expected {expected} columns, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    /// A timestamp could not be parsed.
    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    /// A numeric field could not be parsed.
    #[error("unparseable {field} value '{value}'")]
    BadNumber { field: &'static str, value: String },

    /// The row parsed but its values are not plausible sensor output.
    #[error("implausible values: {0}")]
    Implausible(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_display() {
        let err = RowError::BadTimestamp("not-a-date".into());
        assert!(err.to_string().contains("not-a-date"));

        let err = RowError::BadNumber {
            field: "co2",
            value: "abc".into(),
        };
        assert!(err.to_string().contains("co2"));
        assert!(err.to_string().contains("abc"));
    }
}

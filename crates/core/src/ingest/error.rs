//! Ingest error types.

use thiserror::Error;

/// Errors raised while reading a tabular upload.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The underlying CSV reader failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row.
    #[error("File has no header row")]
    MissingHeaders,

    /// A required column is absent from the header row.
    #[error("Required column '{0}' not found in header row")]
    MissingColumn(&'static str),
}

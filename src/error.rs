//! Error types for the ingestion boundary
//!
//! The core pipeline never errors on malformed per-record data; every parse
//! step degrades to null instead. Errors exist only at the boundary where
//! raw bytes become records.

use thiserror::Error;

/// Errors that can occur while reading a batch of raw submissions
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid delimited input: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Expected a JSON object at record {0}")]
    NotAnObject(usize),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

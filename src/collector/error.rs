/// Error types for the collector module
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a pagination run
#[derive(Debug, Error)]
pub enum CollectError {
    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The API answered with a non-success result code in its header
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// The body did not have the expected shape
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// A field was present but could not be parsed
    #[error("Failed to parse {field} = {value:?}")]
    Parse { field: &'static str, value: String },
}

/// Errors while writing collected records to disk
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! Error types for loading, munging, and uploading benchmark results.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or posting a result batch.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// The input file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input was not valid JSON.
    #[error("invalid benchmark JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The input parsed, but the top level is not an array.
    #[error("expected a JSON array of benchmark records, found {found}")]
    NotAnArray { found: &'static str },

    /// An element of the input array is not an object.
    #[error("record {index} is not a JSON object")]
    InvalidRecord { index: usize },

    /// A record lacks one of `mean`, `config`, or `units`.
    #[error("record {index} is missing required key `{key}`")]
    MissingKey { index: usize, key: &'static str },

    /// A record carries a required key with the wrong JSON type.
    #[error("record {index} has a non-string `{key}`")]
    InvalidKey { index: usize, key: &'static str },

    /// The transformed batch could not be serialized.
    #[error("failed to encode upload payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced an HTTP response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Result type for benchmark upload operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;

//! Benchstat result munging and upload for Codespeed-style results services.
//!
//! This crate turns the JSON emitted by benchstat into result entries a
//! Codespeed server accepts, then posts them in a single request.
//!
//! # Quick Start
//!
//! ```no_run
//! use codespeed_upload_benchmarks::{upload, InputSource, ResultServer, RunMetadata};
//!
//! let records = InputSource::Stdin.load()?;
//! let meta = RunMetadata::new("demo", "abc123").with_branch("main");
//! let server = ResultServer::new("http://codespeed.local")?;
//!
//! let outcome = upload(records, &meta, &server)?;
//! println!("{outcome:?}");
//! # Ok::<(), codespeed_upload_benchmarks::BenchmarkError>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - Record model, run metadata, and the per-record transform
//! - [`io`] - Reading benchstat JSON and encoding the upload payload
//! - [`upload`] - The results-service client
//! - [`error`] - The crate error type

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod io;
pub mod result;
pub mod upload;

pub use error::{BenchmarkError, Result};
pub use io::InputSource;
pub use result::{Record, RunMetadata, UnitsTitle};
pub use upload::{ResultServer, UploadOutcome};

use serde_json::Value;
use tracing::debug;

/// Transform a parsed batch and encode it as the upload payload.
///
/// # Errors
///
/// Fails if any record is malformed; no partial payload is produced.
pub fn prepare_payload(records: Vec<Value>, meta: &RunMetadata) -> Result<String> {
    let transformed = result::transform_records(records, meta)?;
    debug!(records = transformed.len(), "transformed benchmark records");
    io::encode_payload(&transformed)
}

/// Transform a parsed batch and post it to `server`.
///
/// This is the canonical entrypoint: one batch in, one request out.
///
/// # Errors
///
/// Returns an error for malformed records or when the server cannot be
/// reached. An HTTP error status is reported through
/// [`UploadOutcome::Rejected`] instead.
pub fn upload(records: Vec<Value>, meta: &RunMetadata, server: &ResultServer) -> Result<UploadOutcome> {
    let payload = prepare_payload(records, meta)?;
    server.submit(&payload)
}

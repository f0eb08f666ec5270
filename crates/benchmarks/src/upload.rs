//! Results-service client.
//!
//! A Codespeed-style server accepts a batch of results as a single
//! urlencoded form field named `json`. HTTP error statuses come back as an
//! [`UploadOutcome::Rejected`] rather than an error; only failures that never
//! produce a response are surfaced as [`BenchmarkError::Transport`].

use crate::error::{BenchmarkError, Result};
use reqwest::blocking::Client;
use tracing::{debug, warn};

/// Path appended to the server base URL.
pub const RESULT_ADD_PATH: &str = "/result/add/json/";

/// Form field carrying the JSON payload.
pub const PAYLOAD_FIELD: &str = "json";

/// Build the upload URL for a server base path.
///
/// The path is appended literally, so a trailing slash on `base_url`
/// produces a double slash.
pub fn endpoint(base_url: &str) -> String {
    format!("{base_url}{RESULT_ADD_PATH}")
}

/// What the server said about an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server accepted the batch.
    Accepted {
        /// Response body.
        body: String,
    },
    /// The server answered with an HTTP error status.
    Rejected {
        /// Description of the error status.
        error: String,
        /// Response body.
        body: String,
    },
}

/// Blocking client for one results service.
#[derive(Debug, Clone)]
pub struct ResultServer {
    base_url: String,
    client: Client,
}

impl ResultServer {
    /// Create a client with the HTTP library's default timeouts and TLS setup.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build().map_err(BenchmarkError::Client)?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Base URL as given.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST an encoded payload.
    pub fn submit(&self, payload: &str) -> Result<UploadOutcome> {
        let url = endpoint(&self.base_url);
        debug!(%url, bytes = payload.len(), "posting benchmark results");

        let transport = |source: reqwest::Error| BenchmarkError::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .post(&url)
            .form(&[(PAYLOAD_FIELD, payload)])
            .send()
            .map_err(transport)?;

        let status = response.status();
        let rejection = response.error_for_status_ref().err().map(|e| e.to_string());
        let body = response.text().map_err(transport)?;

        match rejection {
            Some(error) => {
                warn!(%url, %status, "results service rejected upload");
                Ok(UploadOutcome::Rejected { error, body })
            }
            None => {
                debug!(%url, %status, "results service accepted upload");
                Ok(UploadOutcome::Accepted { body })
            }
        }
    }
}

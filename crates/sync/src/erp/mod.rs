//! ERP JSON-RPC client.
//!
//! Provides read-only access to an Odoo-style `/jsonrpc` endpoint: product
//! templates for import, installed modules for display.
//!
//! # Architecture
//!
//! - [`RpcTransport`] - JSON-RPC 2.0 envelopes over HTTP POST, one request per call
//! - [`AuthCache`] - one `common.authenticate` round-trip per process, result memoized
//! - [`ErpClient`] - transport + auth cache; the authenticated `execute_kw` entry point
//! - [`CatalogReader`] - `search_read`/`read` queries with field projection and limits
//!
//! The ERP session is never refreshed. If the ERP expires the uid mid-process,
//! later calls surface as [`ErpError::Fault`] and the process must be restarted.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod transport;

pub use auth::{AuthCache, AuthSession};
pub use catalog::CatalogReader;
pub use client::ErpClient;
pub use transport::RpcTransport;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the ERP.
#[derive(Debug, Error)]
pub enum ErpError {
    /// Network failure, timeout, or HTTP client construction failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The ERP answered with a non-2xx status.
    #[error("ERP returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body (truncated).
        body: String,
    },

    /// The body was not JSON, or had neither `result` nor `error`.
    #[error("Malformed ERP response: {0}")]
    MalformedResponse(String),

    /// The `result` did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The ERP returned an explicit `error` payload.
    #[error("ERP fault: {0}")]
    Fault(RpcFault),

    /// Authentication returned the falsy sentinel (now or earlier in this process).
    #[error("Cannot authenticate to ERP database '{database}' as '{login}'")]
    NotAuthenticated {
        /// Login used for authentication.
        login: String,
        /// ERP database name.
        database: String,
    },
}

/// An `error` object returned by the ERP.
///
/// The payload shape is ERP-specific and kept opaque; only a human-readable
/// message is extracted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcFault {
    payload: Value,
}

/// Exception raised by the ERP when `read` targets an id with no record.
const MISSING_ERROR: &str = "odoo.exceptions.MissingError";

impl RpcFault {
    /// Wrap a raw `error` payload.
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The raw payload, for diagnostics.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Numeric error code, if the ERP sent one.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.payload.get("code").and_then(Value::as_i64)
    }

    /// Server-side exception class (`data.name`), e.g.
    /// `odoo.exceptions.MissingError`.
    #[must_use]
    pub fn exception_name(&self) -> Option<&str> {
        self.payload
            .get("data")
            .and_then(|data| data.get("name"))
            .and_then(Value::as_str)
    }

    /// Whether the ERP reported that a requested record does not exist.
    #[must_use]
    pub fn is_missing_record(&self) -> bool {
        self.exception_name() == Some(MISSING_ERROR)
    }

    /// Best-effort human-readable message.
    ///
    /// Prefers the server-side exception message (`data.message`) over the
    /// generic envelope message (`"Odoo Server Error"`).
    #[must_use]
    pub fn message(&self) -> String {
        let detail = self
            .payload
            .get("data")
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str);
        let envelope = self.payload.get("message").and_then(Value::as_str);

        detail
            .or(envelope)
            .map_or_else(|| self.payload.to_string(), str::to_string)
    }
}

impl std::fmt::Display for RpcFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{} (code {code})", self.message()),
            None => f.write_str(&self.message()),
        }
    }
}

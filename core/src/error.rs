//! Error types for the SCM client.
//!
//! # Design
//! `ScmError` is the single error surfaced by every client operation. A
//! failing HTTP status lands in `Status` together with the response metadata,
//! so callers can still read headers after a rejected call. Transport-level
//! failures are kept in their own `TransportError` enum and wrapped unchanged.

use thiserror::Error;

use crate::config::Service;
use crate::types::Response;

/// Errors returned by `Client` construction and every service operation.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The base endpoint could not be parsed as a URL usable as a base.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP exchange could not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status code above 300.
    ///
    /// `text` is the standard reason phrase for the status code.
    #[error("{text}")]
    Status { text: String, response: Response },

    /// The response body could not be decoded into the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Copying the raw response body into the caller's sink failed.
    #[error("failed to copy response body: {0}")]
    Io(#[from] std::io::Error),

    /// The driver has no implementation for this operation.
    #[error("operation not supported by the driver")]
    NotSupported,

    /// The service was left out of the client's configured capability set.
    #[error("the {0} service is not enabled for this client")]
    ServiceDisabled(Service),

    /// A webhook carried an event type the driver does not understand.
    #[error("unknown webhook event {0:?}")]
    UnknownEvent(String),

    /// A webhook request was missing data or carried a malformed payload.
    #[error("invalid webhook: {0}")]
    InvalidWebhook(String),

    /// Client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScmError {
    /// Response metadata attached to a `Status` error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ScmError::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// HTTP status code of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}

/// Failures raised by a `Transport` before a response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The calling context was cancelled before or during the exchange.
    #[error("request cancelled")]
    Cancelled,

    /// The context deadline or the configured timeout elapsed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The request could not be assembled (bad path, header or method).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client reported a failure (connection refused, TLS, protocol).
    #[error("http request failed: {0}")]
    Request(#[source] ureq::Error),

    /// Reading the response body failed.
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::DeadlineExceeded,
            other => TransportError::Request(other),
        }
    }
}

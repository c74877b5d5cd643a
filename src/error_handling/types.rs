//! Error type definitions.
//!
//! Transport and parse failures are real errors; protocol-level
//! non-conformance (non-200 status, wrong content type) is data and never
//! appears here.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

use crate::tls::TlsVersion;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error building the connector used to measure TLS versions.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(#[from] openssl::error::ErrorStack),
}

/// Transport-level failure of a single content-negotiated request.
///
/// Carries the TLS classification observed for the endpoint so a failed
/// request still reports a TLS version.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS handshake, or timeout failure.
    #[error("making the GET request to {url} failed: {source}")]
    Request {
        url: String,
        tls_version: TlsVersion,
        #[source]
        source: ReqwestError,
    },

    /// The response arrived but its body could not be read.
    #[error("reading the response from {url} failed: {source}")]
    Body {
        url: String,
        tls_version: TlsVersion,
        #[source]
        source: ReqwestError,
    },

    /// The request carries a streaming body and cannot be re-sent.
    #[error("unable to reuse the GET request to {url}")]
    NotReusable { url: String },
}

impl FetchError {
    /// TLS version known at the time of failure.
    pub fn tls_version(&self) -> TlsVersion {
        match self {
            FetchError::Request { tls_version, .. } | FetchError::Body { tls_version, .. } => {
                *tls_version
            }
            FetchError::NotReusable { .. } => TlsVersion::Unknown,
        }
    }
}

/// Failure to interpret a response body as a capability document.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The body is not valid JSON.
    #[error("capability statement is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is JSON but not a JSON object.
    #[error("capability statement is not a JSON object")]
    NotAnObject,
}

/// Failure of a capability probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The endpoint URL could not be parsed after normalization.
    #[error("unable to create new GET request from URL: {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The GET request could not be built.
    #[error("unable to create new GET request from URL: {url}: {source}")]
    RequestBuild {
        url: String,
        #[source]
        source: ReqwestError,
    },

    /// Transport failure during content negotiation.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The capability statement could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The probe was cancelled by the caller.
    #[error("capability probe was cancelled")]
    Cancelled,

    /// The probe's deadline passed before it completed.
    #[error("capability probe deadline exceeded")]
    DeadlineExceeded,
}

impl ProbeError {
    /// TLS version known at the time of failure, if a request was attempted.
    pub fn tls_version(&self) -> Option<TlsVersion> {
        match self {
            ProbeError::Fetch(e) => Some(e.tls_version()),
            _ => None,
        }
    }
}

/// Failure to hand a message to the downstream queue.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The receiving side of the queue has gone away.
    #[error("queue '{0}' is closed")]
    Closed(String),
}

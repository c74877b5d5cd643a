//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources a probe
//! needs:
//! - HTTP client (timeouts, user agent)
//! - TLS connector used to measure negotiated TLS versions
//! - Logger
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use openssl::ssl::SslConnector;

use crate::error_handling::InitializationError;
use crate::tls::measurement_connector;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the shared connector that measures negotiated TLS versions.
///
/// # Errors
///
/// Returns `InitializationError::TlsConfigError` if OpenSSL rejects the
/// connector settings.
pub fn init_tls_connector() -> Result<Arc<SslConnector>, InitializationError> {
    Ok(Arc::new(measurement_connector()?))
}

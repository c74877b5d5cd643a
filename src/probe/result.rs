//! Per-endpoint probe outcome.

use serde_json::Value;

use crate::capability::CapabilityDocument;
use crate::fetch::MimeType;
use crate::tls::TlsVersion;

/// HTTP status recorded when no response was received.
pub const NO_HTTP_RESPONSE: u16 = 0;

/// Outcome of acquiring one endpoint's capability statement.
///
/// A populated `error` does not preclude partial results: status, TLS
/// version, and MIME support gathered before the failure are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Endpoint URL as supplied by the caller
    pub url: String,
    /// Description of the transport or parse failure, if any
    pub error: Option<String>,
    /// Content types confirmed to produce a JSON response (legacy first)
    pub supported_mime_types: Vec<MimeType>,
    /// TLS version of the authoritative request
    pub tls_version: TlsVersion,
    /// HTTP status of the authoritative request, or `NO_HTTP_RESPONSE`
    pub http_status: u16,
    /// Capability statement, when a JSON body was read
    pub capability_statement: Option<Value>,
}

impl ProbeResult {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            error: None,
            supported_mime_types: Vec::new(),
            tls_version: TlsVersion::Unknown,
            http_status: NO_HTTP_RESPONSE,
            capability_statement: None,
        }
    }

    /// Structured view of the capability statement, if it is a JSON object.
    pub fn capability_document(&self) -> Option<CapabilityDocument<'_>> {
        self.capability_statement
            .as_ref()
            .and_then(|value| CapabilityDocument::new(value).ok())
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

//! HTTP capability fetching.
//!
//! This module issues content-negotiated GET requests and reports the raw
//! response metadata (status, TLS version, JSON content-type match, body).

mod mime;
mod request;

#[cfg(test)]
mod tests;

pub use mime::{is_json_mime_type, MimeType};
pub use request::{CapabilityFetcher, FetchOutcome};

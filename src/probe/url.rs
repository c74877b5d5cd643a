//! Endpoint URL normalization.

use crate::config::{METADATA_PATH, SMART_CONFIGURATION_PATH};

/// Normalizes a FHIR endpoint URL to the URL of its capability statement.
///
/// Trims whitespace, adds an `https://` prefix when no scheme is given, drops
/// a trailing `/`, and appends `/metadata` unless the URL already ends with it.
pub fn normalize_endpoint_url(url: &str) -> String {
    let trimmed = url.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let base = with_scheme.trim_end_matches('/');
    if base.ends_with(METADATA_PATH) {
        base.to_string()
    } else {
        format!("{base}{METADATA_PATH}")
    }
}

/// URL of the SMART configuration document for a FHIR endpoint.
pub fn smart_configuration_url(url: &str) -> String {
    let metadata = normalize_endpoint_url(url);
    let base = metadata
        .strip_suffix(METADATA_PATH)
        .unwrap_or(metadata.as_str());
    format!("{base}{SMART_CONFIGURATION_PATH}")
}

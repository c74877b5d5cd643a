//! FHIR JSON MIME types.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::DSTU2_FHIR_VERSIONS;

/// JSON content types a FHIR server may serve its capability statement as.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum MimeType {
    /// `application/json+fhir`, used by DSTU2 and earlier
    #[strum(serialize = "application/json+fhir")]
    #[serde(rename = "application/json+fhir")]
    Fhir2LessJson,
    /// `application/fhir+json`, used by STU3 and later
    #[strum(serialize = "application/fhir+json")]
    #[serde(rename = "application/fhir+json")]
    Fhir3PlusJson,
}

impl MimeType {
    /// Header value for this MIME type.
    pub fn as_str(self) -> &'static str {
        match self {
            MimeType::Fhir2LessJson => "application/json+fhir",
            MimeType::Fhir3PlusJson => "application/fhir+json",
        }
    }

    /// MIME type a server implementing `fhir_version` is required to serve.
    pub fn for_fhir_version(fhir_version: &str) -> Self {
        if DSTU2_FHIR_VERSIONS.contains(&fhir_version) {
            MimeType::Fhir2LessJson
        } else {
            MimeType::Fhir3PlusJson
        }
    }
}

/// Whether a `Content-Type` header value names a JSON flavour.
///
/// Servers tend to cache the first JSON type they were asked for and keep
/// answering with it, so any JSON flavour counts, not only the exact type
/// requested.
pub fn is_json_mime_type(content_type: &str) -> bool {
    content_type.split("; ").any(|part| part.contains("json"))
}

//! TLS version classification.

use openssl::ssl::SslVersion;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// TLS version observed on an endpoint's connection.
///
/// Serialized as the literal label (`"TLS 1.2"`, `"No TLS"`, ...) consumers
/// of the capability message depend on.
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
pub enum TlsVersion {
    #[strum(serialize = "SSL 3.0")]
    #[serde(rename = "SSL 3.0")]
    Ssl30,
    #[strum(serialize = "TLS 1.0")]
    #[serde(rename = "TLS 1.0")]
    Tls10,
    #[strum(serialize = "TLS 1.1")]
    #[serde(rename = "TLS 1.1")]
    Tls11,
    #[strum(serialize = "TLS 1.2")]
    #[serde(rename = "TLS 1.2")]
    Tls12,
    #[strum(serialize = "TLS 1.3")]
    #[serde(rename = "TLS 1.3")]
    Tls13,
    /// TLS was negotiated (or attempted) but the version could not be determined.
    #[strum(serialize = "TLS version unknown")]
    #[serde(rename = "TLS version unknown")]
    Unknown,
    /// The connection was not secured.
    #[strum(serialize = "No TLS")]
    #[serde(rename = "No TLS")]
    NoTls,
}

impl TlsVersion {
    /// Whether the version meets the "TLS 1.2 or higher" requirement.
    pub fn is_modern(self) -> bool {
        matches!(self, TlsVersion::Tls12 | TlsVersion::Tls13)
    }
}

/// Protocol constants with a label of their own.
const KNOWN_VERSIONS: [(SslVersion, TlsVersion); 5] = [
    (SslVersion::SSL3, TlsVersion::Ssl30),
    (SslVersion::TLS1, TlsVersion::Tls10),
    (SslVersion::TLS1_1, TlsVersion::Tls11),
    (SslVersion::TLS1_2, TlsVersion::Tls12),
    (SslVersion::TLS1_3, TlsVersion::Tls13),
];

/// Classifies the protocol version of a connection.
///
/// `None` means the connection carries no TLS state. Any other protocol
/// constant (DTLS, values a newer OpenSSL may report) is `Unknown`.
pub fn classify_protocol_version(version: Option<SslVersion>) -> TlsVersion {
    let Some(version) = version else {
        return TlsVersion::NoTls;
    };
    KNOWN_VERSIONS
        .into_iter()
        .find(|(known, _)| *known == version)
        .map_or(TlsVersion::Unknown, |(_, label)| label)
}

//! TLS version detection.
//!
//! The HTTP client does not expose the negotiated protocol version, so once
//! a response arrives the version is measured by an OpenSSL handshake
//! against the host and port that served it. The handshake skips trust
//! verification and allows every protocol version the library supports,
//! so it reports what the server speaks rather than what a strict client
//! would accept. A failed handshake never fails the probe; it classifies as
//! `TlsVersion::Unknown`.

mod version;

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::debug;
use openssl::error::ErrorStack;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use url::{Host, Url};

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS};

pub use version::{classify_protocol_version, TlsVersion};

/// Builds the connector used to measure negotiated TLS versions.
///
/// Certificates and host names are not verified, and the minimum protocol
/// version and security level are lowered so legacy servers still complete
/// a handshake.
///
/// # Errors
///
/// Returns the OpenSSL error stack if the context cannot be configured.
pub fn measurement_connector() -> Result<SslConnector, ErrorStack> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    builder.set_verify(SslVerifyMode::NONE);
    builder.set_min_proto_version(None)?;
    builder.set_cipher_list("ALL:@SECLEVEL=0")?;
    Ok(builder.build())
}

/// TLS version to report when no handshake was measured.
///
/// Plain `http` URLs carry no TLS state. For `https` the version is
/// undeterminable, for example because the connection failed.
pub fn unmeasured_tls_version(url: &Url) -> TlsVersion {
    if url.scheme() == "https" {
        TlsVersion::Unknown
    } else {
        TlsVersion::NoTls
    }
}

/// Determines the TLS version the server behind `url` negotiates.
///
/// Returns `TlsVersion::NoTls` for non-`https` URLs without opening a
/// connection, and `TlsVersion::Unknown` when the connection or handshake
/// fails.
pub async fn negotiate_tls_version(url: &Url, connector: Arc<SslConnector>) -> TlsVersion {
    if url.scheme() != "https" {
        return TlsVersion::NoTls;
    }
    let target = url.clone();
    let measured = tokio::task::spawn_blocking(move || handshake(&target, &connector)).await;
    match measured {
        Ok(Ok(version)) => version,
        Ok(Err(e)) => {
            debug!("Unable to determine TLS version for {url}: {e:#}");
            TlsVersion::Unknown
        }
        Err(e) => {
            debug!("TLS measurement task for {url} did not complete: {e}");
            TlsVersion::Unknown
        }
    }
}

fn handshake(url: &Url, connector: &SslConnector) -> Result<TlsVersion> {
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("no port for {}", url))?;
    let connect_host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(anyhow!("URL has no host: {}", url)),
    };

    let connect_timeout = Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS);
    let addrs = (connect_host.as_str(), port)
        .to_socket_addrs()
        .with_context(|| format!("resolving {connect_host}:{port}"))?;
    let sock = addrs
        .into_iter()
        .find_map(|addr| TcpStream::connect_timeout(&addr, connect_timeout).ok())
        .ok_or_else(|| {
            anyhow!(
                "TCP connection to {}:{} failed ({}s timeout)",
                connect_host,
                port,
                TCP_CONNECT_TIMEOUT_SECS
            )
        })?;
    let handshake_timeout = Some(Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS));
    sock.set_read_timeout(handshake_timeout)?;
    sock.set_write_timeout(handshake_timeout)?;

    // SNI is only sent for domain names
    let tls_stream = connector
        .configure()?
        .verify_hostname(false)
        .connect(&connect_host, sock)
        .map_err(|e| anyhow!("TLS handshake with {}:{} failed: {}", connect_host, port, e))?;

    let version = tls_stream.ssl().version2();
    debug!("Negotiated {version:?} with {connect_host}:{port}");
    // A completed handshake always has a version; treat a missing one as undeterminable
    Ok(match version {
        Some(_) => classify_protocol_version(version),
        None => TlsVersion::Unknown,
    })
}

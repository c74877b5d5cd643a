//! Content-negotiated capability requests.

use std::sync::Arc;

use log::debug;
use openssl::ssl::SslConnector;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Request, Response, StatusCode};

use crate::error_handling::FetchError;
use crate::fetch::mime::{is_json_mime_type, MimeType};
use crate::tls::{negotiate_tls_version, unmeasured_tls_version, TlsVersion};

/// Raw outcome of one content-negotiated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// HTTP status code of the response
    pub http_status: u16,
    /// TLS version negotiated by the server that produced the response
    pub tls_version: TlsVersion,
    /// Whether a 200 response came back with a JSON content type
    pub mime_matched: bool,
    /// Full response body, read only when `mime_matched`
    pub body: Option<Vec<u8>>,
}

/// Issues content-negotiated GET requests against a single endpoint.
///
/// Cloning is cheap: the HTTP client and TLS connector are shared.
#[derive(Clone)]
pub struct CapabilityFetcher {
    client: reqwest::Client,
    tls_connector: Arc<SslConnector>,
}

impl std::fmt::Debug for CapabilityFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityFetcher")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl CapabilityFetcher {
    /// Creates a fetcher from a configured HTTP client and the connector
    /// used to measure TLS versions.
    pub fn new(client: reqwest::Client, tls_connector: Arc<SslConnector>) -> Self {
        Self {
            client,
            tls_connector,
        }
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends `request` with its `Accept` header set to `mime_type`.
    ///
    /// The request itself is not consumed; a copy is sent so the caller can
    /// reuse it for the next negotiation pass. A non-2xx status is reported in
    /// the outcome, not as an error. The TLS version is measured against the
    /// URL the response came from, after any redirects.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` for transport-level failures (connection, DNS, TLS
    /// handshake, timeout) and for a body that cannot be read.
    pub async fn fetch_with_content_type(
        &self,
        request: &Request,
        mime_type: MimeType,
    ) -> Result<FetchOutcome, FetchError> {
        let response = self.send(request, mime_type).await?;
        let final_url = response.url().clone();
        let tls_version = negotiate_tls_version(&final_url, Arc::clone(&self.tls_connector)).await;
        let http_status = response.status().as_u16();
        let body = read_json_body(response, mime_type, tls_version).await?;

        Ok(FetchOutcome {
            http_status,
            tls_version,
            mime_matched: body.is_some(),
            body,
        })
    }

    /// Whether the endpoint answers `mime_type` with a 200 JSON response.
    ///
    /// Same request handling as `fetch_with_content_type`, without measuring
    /// the TLS version.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` for transport-level failures.
    pub async fn supports_content_type(
        &self,
        request: &Request,
        mime_type: MimeType,
    ) -> Result<bool, FetchError> {
        let response = self.send(request, mime_type).await?;
        let tls_version = unmeasured_tls_version(response.url());
        Ok(read_json_body(response, mime_type, tls_version)
            .await?
            .is_some())
    }

    async fn send(&self, request: &Request, mime_type: MimeType) -> Result<Response, FetchError> {
        let url = request.url().clone();
        let mut req = request
            .try_clone()
            .ok_or_else(|| FetchError::NotReusable {
                url: url.to_string(),
            })?;
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static(mime_type.as_str()));

        debug!("Requesting {url} with Accept: {mime_type}");
        self.client.execute(req).await.map_err(|source| {
            // No connection to measure; classify by the URL that failed
            let tls_version = unmeasured_tls_version(source.url().unwrap_or(&url));
            FetchError::Request {
                url: url.to_string(),
                tls_version,
                source,
            }
        })
    }
}

/// Reads the body of a 200 response with a JSON content type.
///
/// Returns `None` for any other status or content type.
async fn read_json_body(
    response: Response,
    mime_type: MimeType,
    tls_version: TlsVersion,
) -> Result<Option<Vec<u8>>, FetchError> {
    if response.status() != StatusCode::OK {
        return Ok(None);
    }
    let url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_json_mime_type(&content_type) {
        debug!("{url} answered Accept: {mime_type} with Content-Type: {content_type:?}");
        return Ok(None);
    }
    let bytes = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        tls_version,
        source,
    })?;
    Ok(Some(bytes.to_vec()))
}

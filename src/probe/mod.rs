//! Capability probe orchestration.
//!
//! Drives the fetcher through a two-pass content negotiation:
//!
//! 1. Request the capability statement as `application/fhir+json`.
//! 2. If that did not produce a 200 JSON response, request it again as
//!    `application/json+fhir` and adopt that response as authoritative.
//!    Otherwise request it as `application/json+fhir` only to learn whether
//!    the legacy type is also supported.
//!
//! Servers that only implement the legacy type are therefore not reported
//! as unreachable, and the modern-type success path costs one extra request.

mod context;
mod result;
mod smart;
mod url;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::StatusCode;

use crate::capability::parse_capability_statement;
use crate::error_handling::ProbeError;
use crate::fetch::{CapabilityFetcher, MimeType};
use crate::publish::{Message, Publisher};

pub use context::ProbeContext;
pub use result::{ProbeResult, NO_HTTP_RESPONSE};
pub use smart::request_smart_configuration;
pub use url::{normalize_endpoint_url, smart_configuration_url};

/// Acquires an endpoint's capability statement and supported content types.
///
/// Never fails outright: a transport or parse failure is recorded in
/// `ProbeResult::error` alongside whatever was learned before it.
pub async fn acquire_capability_probe(
    ctx: &ProbeContext,
    endpoint_url: &str,
    fetcher: &CapabilityFetcher,
) -> ProbeResult {
    let mut result = ProbeResult::new(endpoint_url);
    match request_capability_statement(ctx, endpoint_url, fetcher, &mut result).await {
        Ok(()) => info!(
            "Probed {endpoint_url}: HTTP {}, {}, MIME types {:?}",
            result.http_status, result.tls_version, result.supported_mime_types
        ),
        Err(e) => {
            warn!("Got error:\n{e}\n\nfrom URL: {endpoint_url}");
            if let Some(tls_version) = e.tls_version() {
                result.tls_version = tls_version;
            }
            result.error = Some(e.to_string());
        }
    }
    result
}

/// Fills `result` with the HTTP status, TLS version, supported MIME types,
/// and capability statement of the endpoint.
async fn request_capability_statement(
    ctx: &ProbeContext,
    endpoint_url: &str,
    fetcher: &CapabilityFetcher,
    result: &mut ProbeResult,
) -> Result<(), ProbeError> {
    let normalized = normalize_endpoint_url(endpoint_url);
    let url = reqwest::Url::parse(&normalized).map_err(|source| ProbeError::InvalidUrl {
        url: normalized.clone(),
        source,
    })?;
    let request = fetcher
        .client()
        .get(url)
        .build()
        .map_err(|source| ProbeError::RequestBuild {
            url: normalized.clone(),
            source,
        })?;

    let modern = ctx
        .run(fetcher.fetch_with_content_type(&request, MimeType::Fhir3PlusJson))
        .await?;
    let supports_modern = modern.mime_matched;

    let (authoritative, supports_legacy) =
        if modern.http_status != StatusCode::OK.as_u16() || !modern.mime_matched {
            debug!("{normalized} did not serve {}; retrying with the legacy type", MimeType::Fhir3PlusJson);
            let legacy = ctx
                .run(fetcher.fetch_with_content_type(&request, MimeType::Fhir2LessJson))
                .await?;
            let supports_legacy = legacy.mime_matched;
            (legacy, supports_legacy)
        } else {
            let supports_legacy = ctx
                .run(fetcher.supports_content_type(&request, MimeType::Fhir2LessJson))
                .await?;
            (modern, supports_legacy)
        };

    result.http_status = authoritative.http_status;
    result.tls_version = authoritative.tls_version;
    if supports_legacy {
        result.supported_mime_types.push(MimeType::Fhir2LessJson);
    }
    if supports_modern {
        result.supported_mime_types.push(MimeType::Fhir3PlusJson);
    }
    if let Some(body) = authoritative.body {
        result.capability_statement = Some(parse_capability_statement(&body)?);
    }

    Ok(())
}

/// Statically typed arguments for probing one endpoint and queueing the result.
#[derive(Debug, Clone)]
pub struct QuerierArgs {
    /// FHIR endpoint URL as supplied; published unchanged in the message
    pub fhir_url: String,
    /// Fetcher bound to the caller's configured HTTP client
    pub fetcher: CapabilityFetcher,
    /// Destination queue for the finished message
    pub queue_name: String,
}

impl QuerierArgs {
    /// Validates the endpoint URL once, up front.
    ///
    /// The endpoint is kept as supplied; only its normalized capability
    /// statement URL has to parse.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::InvalidUrl` if the normalized URL cannot be parsed.
    pub fn new(
        fhir_url: &str,
        fetcher: CapabilityFetcher,
        queue_name: impl Into<String>,
    ) -> Result<Self, ProbeError> {
        let normalized = normalize_endpoint_url(fhir_url);
        reqwest::Url::parse(&normalized).map_err(|source| ProbeError::InvalidUrl {
            url: normalized.clone(),
            source,
        })?;
        Ok(Self {
            fhir_url: fhir_url.to_string(),
            fetcher,
            queue_name: queue_name.into(),
        })
    }
}

/// Probes an endpoint and publishes the resulting message to the queue.
///
/// A failed probe is still published, with its error in the message.
///
/// # Errors
///
/// Returns an error if the message cannot be serialized or published.
pub async fn get_and_send_capability_statement<P: Publisher>(
    ctx: &ProbeContext,
    args: &QuerierArgs,
    publisher: &P,
) -> Result<ProbeResult> {
    let url = args.fhir_url.as_str();
    let result = acquire_capability_probe(ctx, url, &args.fetcher).await;

    let message = Message::from(&result);
    let payload = serde_json::to_string(&message)
        .with_context(|| format!("error marshalling json message for request to {url}"))?;

    publisher
        .publish(&args.queue_name, payload)
        .await
        .with_context(|| {
            format!(
                "error sending capability statement for FHIR endpoint {url} to queue '{}'",
                args.queue_name
            )
        })?;

    Ok(result)
}

//! SMART-configuration auxiliary probe.

use log::debug;
use reqwest::header::ACCEPT;

use crate::probe::context::ProbeContext;
use crate::probe::result::NO_HTTP_RESPONSE;
use crate::probe::url::smart_configuration_url;

/// Requests `<base>/.well-known/smart-configuration` for a FHIR endpoint.
///
/// Returns the HTTP status, or `NO_HTTP_RESPONSE` when no response was
/// received (transport failure, cancellation, deadline). The rule that
/// consumes this status treats `NO_HTTP_RESPONSE` as "not attempted".
pub async fn request_smart_configuration(
    ctx: &ProbeContext,
    endpoint_url: &str,
    client: &reqwest::Client,
) -> u16 {
    let url = smart_configuration_url(endpoint_url);
    let send = client
        .get(&url)
        .header(ACCEPT, "application/json")
        .send();

    let result = ctx.guard(send).await;
    match result {
        Ok(Ok(response)) => {
            let status = response.status().as_u16();
            debug!("SMART configuration at {url} returned {status}");
            status
        }
        Ok(Err(e)) => {
            debug!("SMART configuration request to {url} failed: {e}");
            NO_HTTP_RESPONSE
        }
        Err(e) => {
            debug!("SMART configuration request to {url} aborted: {e}");
            NO_HTTP_RESPONSE
        }
    }
}

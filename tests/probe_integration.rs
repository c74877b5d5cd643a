//! Integration tests for the capability probe
//!
//! These tests verify the two-pass content negotiation against mock servers:
//! - Servers serving only the modern or only the legacy JSON MIME type
//! - Non-200 responses and unparseable bodies
//! - Cancellation and deadlines
//! - Publishing the finished message

mod helpers;

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capability_status::probe::request_smart_configuration;
use capability_status::{
    acquire_capability_probe, get_and_send_capability_statement, ChannelPublisher, MimeType,
    ProbeContext, QuerierArgs, TlsVersion,
};
use helpers::{conformant_capability_statement, create_fetcher, mount_metadata, mount_smart_configuration};

const MODERN: &str = "application/fhir+json";
const LEGACY: &str = "application/json+fhir";

#[tokio::test]
async fn test_modern_only_server() {
    let server = MockServer::start().await;
    let body = conformant_capability_statement().to_string();
    mount_metadata(&server, MODERN, 200, MODERN, &body).await;
    mount_metadata(&server, LEGACY, 200, "application/fhir+xml", "<CapabilityStatement/>").await;

    let result = acquire_capability_probe(&ProbeContext::new(), &server.uri(), &create_fetcher()).await;

    assert!(result.is_success(), "unexpected error: {:?}", result.error);
    assert_eq!(result.http_status, 200);
    assert_eq!(result.supported_mime_types, vec![MimeType::Fhir3PlusJson]);
    assert_eq!(result.tls_version, TlsVersion::NoTls);
    assert_eq!(result.capability_statement, Some(conformant_capability_statement()));
}

#[tokio::test]
async fn test_legacy_only_server_is_not_unreachable() {
    let server = MockServer::start().await;
    let body = conformant_capability_statement().to_string();
    mount_metadata(&server, MODERN, 406, "text/plain", "Not Acceptable").await;
    mount_metadata(&server, LEGACY, 200, LEGACY, &body).await;

    let result = acquire_capability_probe(&ProbeContext::new(), &server.uri(), &create_fetcher()).await;

    assert!(result.is_success());
    assert_eq!(result.http_status, 200);
    assert_eq!(result.supported_mime_types, vec![MimeType::Fhir2LessJson]);
    assert!(result.capability_statement.is_some());
}

#[tokio::test]
async fn test_server_answering_any_json_supports_both_types() {
    let server = MockServer::start().await;
    let body = conformant_capability_statement().to_string();
    // A server that caches its first JSON flavour answers both requests with it.
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/fhir+json; charset=UTF-8"))
        .expect(2)
        .mount(&server)
        .await;

    let result = acquire_capability_probe(&ProbeContext::new(), &server.uri(), &create_fetcher()).await;

    assert_eq!(
        result.supported_mime_types,
        vec![MimeType::Fhir2LessJson, MimeType::Fhir3PlusJson]
    );
}

#[tokio::test]
async fn test_not_found_is_data_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let result = acquire_capability_probe(&ProbeContext::new(), &server.uri(), &create_fetcher()).await;

    assert!(result.is_success());
    assert_eq!(result.http_status, 404);
    assert!(result.supported_mime_types.is_empty());
    assert!(result.capability_statement.is_none());
}

#[tokio::test]
async fn test_invalid_json_body_is_a_probe_error() {
    let server = MockServer::start().await;
    mount_metadata(&server, MODERN, 200, MODERN, "{not json").await;
    mount_metadata(&server, LEGACY, 200, LEGACY, "{not json").await;

    let result = acquire_capability_probe(&ProbeContext::new(), &server.uri(), &create_fetcher()).await;

    let error = result.error.as_deref().expect("parse failure should be reported");
    assert!(error.contains("not valid JSON"), "error: {error}");
    // Status and MIME support learned before the parse failure are kept.
    assert_eq!(result.http_status, 200);
    assert_eq!(
        result.supported_mime_types,
        vec![MimeType::Fhir2LessJson, MimeType::Fhir3PlusJson]
    );
    assert!(result.capability_statement.is_none());
}

#[tokio::test]
async fn test_unreachable_endpoint_records_transport_error() {
    let result = acquire_capability_probe(
        &ProbeContext::new(),
        "http://127.0.0.1:1/fhir",
        &create_fetcher(),
    )
    .await;

    let error = result.error.as_deref().expect("transport failure should be reported");
    assert!(error.contains("making the GET request"), "error: {error}");
    assert_eq!(result.http_status, 0);
    assert_eq!(result.tls_version, TlsVersion::NoTls);
}

#[tokio::test]
async fn test_cancelled_context_aborts_probe() {
    let server = MockServer::start().await;
    let ctx = ProbeContext::new();
    ctx.cancel();

    let result = acquire_capability_probe(&ctx, &server.uri(), &create_fetcher()).await;

    assert_eq!(result.error.as_deref(), Some("capability probe was cancelled"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_deadline_aborts_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let ctx = ProbeContext::with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let result = acquire_capability_probe(&ctx, &server.uri(), &create_fetcher()).await;

    assert_eq!(result.error.as_deref(), Some("capability probe deadline exceeded"));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_get_and_send_publishes_wire_message() {
    let server = MockServer::start().await;
    let body = conformant_capability_statement().to_string();
    mount_metadata(&server, MODERN, 200, MODERN, &body).await;
    mount_metadata(&server, LEGACY, 415, "text/plain", "").await;

    let args = QuerierArgs::new(&format!("{}/metadata", server.uri()), create_fetcher(), "capabilities")
        .expect("valid URL");
    let (publisher, mut queue) = ChannelPublisher::new(1);

    let result = get_and_send_capability_statement(&ProbeContext::new(), &args, &publisher)
        .await
        .expect("publish should succeed");
    assert_eq!(result.http_status, 200);

    let queued = queue.recv().await.expect("one message");
    assert_eq!(queued.destination, "capabilities");
    let message: Value = serde_json::from_str(&queued.payload).expect("JSON payload");
    assert_eq!(message["url"], format!("{}/metadata", server.uri()));
    assert_eq!(message["err"], "");
    assert_eq!(message["mimeTypes"], serde_json::json!([MODERN]));
    assert_eq!(message["tlsVersion"], "No TLS");
    assert_eq!(message["httpResponse"], 200);
    assert_eq!(message["capabilityStatement"]["kind"], "instance");
}

#[tokio::test]
async fn test_get_and_send_fails_when_queue_closed() {
    let server = MockServer::start().await;
    let args = QuerierArgs::new(&server.uri(), create_fetcher(), "capabilities").expect("valid URL");
    let (publisher, queue) = ChannelPublisher::new(1);
    drop(queue);

    let err = get_and_send_capability_statement(&ProbeContext::new(), &args, &publisher)
        .await
        .expect_err("closed queue should fail");
    assert!(format!("{err:#}").contains("queue 'capabilities' is closed"));
}

#[tokio::test]
async fn test_querier_args_rejects_invalid_url() {
    assert!(QuerierArgs::new("not a url", create_fetcher(), "capabilities").is_err());
}

#[tokio::test]
async fn test_querier_args_keeps_endpoint_as_supplied() {
    let args = QuerierArgs::new("fhir.example.com/r4/", create_fetcher(), "capabilities")
        .expect("normalizes to a valid URL");
    assert_eq!(args.fhir_url, "fhir.example.com/r4/");
}

#[tokio::test]
async fn test_smart_configuration_status() {
    let server = MockServer::start().await;
    mount_smart_configuration(&server, 200).await;
    let fetcher = create_fetcher();
    let ctx = ProbeContext::new();

    let status = request_smart_configuration(&ctx, &format!("{}/metadata", server.uri()), fetcher.client()).await;
    assert_eq!(status, 200);

    let missing = MockServer::start().await;
    let status = request_smart_configuration(&ctx, &missing.uri(), fetcher.client()).await;
    assert_eq!(status, 404);

    let status = request_smart_configuration(&ctx, "http://127.0.0.1:1", fetcher.client()).await;
    assert_eq!(status, 0);
}

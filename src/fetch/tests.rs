// Fetch module tests.

use reqwest::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::error_handling::FetchError;
use crate::fetch::{CapabilityFetcher, MimeType};
use crate::initialization::init_tls_connector;
use crate::tls::TlsVersion;

fn create_fetcher() -> CapabilityFetcher {
    let client = reqwest::Client::new();
    let tls_connector = init_tls_connector().expect("TLS connector should build");
    CapabilityFetcher::new(client, tls_connector)
}

fn metadata_request(fetcher: &CapabilityFetcher, server: &MockServer) -> reqwest::Request {
    let url = Url::parse(&format!("{}/metadata", server.uri())).expect("valid mock URL");
    fetcher.client().get(url).build().expect("request should build")
}

#[tokio::test]
async fn test_json_response_matches_and_reads_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .and(header("accept", "application/fhir+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"resourceType":"CapabilityStatement"}"#, "application/fhir+json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    let outcome = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect("request should succeed");

    assert_eq!(outcome.http_status, 200);
    assert!(outcome.mime_matched);
    assert_eq!(outcome.tls_version, TlsVersion::NoTls);
    assert_eq!(
        outcome.body.as_deref(),
        Some(br#"{"resourceType":"CapabilityStatement"}"#.as_slice())
    );
}

#[tokio::test]
async fn test_any_json_flavour_matches() {
    // Servers cache the first JSON type they serve regardless of Accept
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}", "application/fhir+json; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    let outcome = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir2LessJson)
        .await
        .expect("request should succeed");

    assert!(outcome.mime_matched);
    assert!(outcome.body.is_some());
}

#[tokio::test]
async fn test_xml_response_does_not_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<CapabilityStatement/>", "application/fhir+xml"))
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    let outcome = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect("request should succeed");

    assert_eq!(outcome.http_status, 200);
    assert!(!outcome.mime_matched);
    assert!(outcome.body.is_none());
}

#[tokio::test]
async fn test_non_200_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(r#"{"resourceType":"OperationOutcome"}"#, "application/fhir+json"))
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    let outcome = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect("a 404 is a response, not a transport failure");

    assert_eq!(outcome.http_status, 404);
    assert!(!outcome.mime_matched);
    assert!(outcome.body.is_none());
}

#[tokio::test]
async fn test_request_is_reusable_across_content_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "application/fhir+json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/fhir+json"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("accept", "application/json+fhir"))
        .respond_with(ResponseTemplate::new(406))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    let modern = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect("first request");
    let legacy = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir2LessJson)
        .await
        .expect("second request");

    assert_eq!(modern.http_status, 200);
    assert_eq!(legacy.http_status, 406);
    // The caller's request is never mutated
    assert!(request.headers().get("accept").is_none());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let fetcher = create_fetcher();
    let url = Url::parse(&format!("http://127.0.0.1:{port}/metadata")).expect("valid URL");
    let request = fetcher.client().get(url).build().expect("request should build");

    let err = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect_err("closed port should fail");

    assert!(matches!(err, FetchError::Request { .. }));
    assert_eq!(err.tls_version(), TlsVersion::NoTls);
    assert!(err.to_string().starts_with("making the GET request to"));
}

#[tokio::test]
async fn test_https_transport_error_skips_tls_measurement() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let fetcher = create_fetcher();
    let url = Url::parse(&format!("https://127.0.0.1:{port}/metadata")).expect("valid URL");
    let request = fetcher.client().get(url).build().expect("request should build");

    let started = std::time::Instant::now();
    let err = fetcher
        .fetch_with_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect_err("closed port should fail");

    // No connection was made, so there is no version to measure
    assert_eq!(err.tls_version(), TlsVersion::Unknown);
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
}

#[tokio::test]
async fn test_supports_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "application/json+fhir"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json+fhir"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("accept", "application/fhir+json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<CapabilityStatement/>", "application/fhir+xml"))
        .mount(&server)
        .await;

    let fetcher = create_fetcher();
    let request = metadata_request(&fetcher, &server);
    assert!(fetcher
        .supports_content_type(&request, MimeType::Fhir2LessJson)
        .await
        .expect("request should succeed"));
    assert!(!fetcher
        .supports_content_type(&request, MimeType::Fhir3PlusJson)
        .await
        .expect("request should succeed"));
}

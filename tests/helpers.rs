// Shared test helpers for mock FHIR servers and probe setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod, SslOptions, SslVersion};
use openssl::x509::{X509NameBuilder, X509};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capability_status::initialization::init_tls_connector;
use capability_status::CapabilityFetcher;

/// Creates a fetcher with a plain client, as the probe tests need no custom timeouts.
#[allow(dead_code)] // Used by other test files
pub fn create_fetcher() -> CapabilityFetcher {
    let client = reqwest::Client::new();
    let tls_connector = init_tls_connector().expect("TLS connector should build");
    CapabilityFetcher::new(client, tls_connector)
}

/// A US Core conformant R4 capability statement.
#[allow(dead_code)]
pub fn conformant_capability_statement() -> Value {
    json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "fhirVersion": "4.0.1",
        "software": {"name": "Example FHIR Server", "version": "5.1"},
        "implementation": {"description": "Example production deployment"},
        "format": ["json"],
        "rest": [{
            "mode": "server",
            "resource": [
                {"type": "Patient", "searchParam": [{"name": "_id"}, {"name": "name"}]},
                {"type": "Observation", "searchParam": [{"name": "code"}, {"name": "date"}]},
                {"type": "Condition"}
            ]
        }],
        "messaging": [{"endpoint": [{"address": "mllp:10.1.1.10:9234"}]}]
    })
}

/// Serves `body` at `/metadata` when the request asks for `accept`.
#[allow(dead_code)]
pub async fn mount_metadata(server: &MockServer, accept: &str, status: u16, content_type: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/metadata"))
        .and(header("accept", accept))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), content_type))
        .mount(server)
        .await;
}

/// Serves the SMART configuration document with `status`.
#[allow(dead_code)]
pub async fn mount_smart_configuration(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/.well-known/smart-configuration"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_raw(r#"{"authorization_endpoint":"https://auth.example.com"}"#, "application/json"),
        )
        .mount(server)
        .await;
}

/// Creates a fetcher whose client trusts any certificate, for the local TLS server.
#[allow(dead_code)]
pub fn create_insecure_fetcher() -> CapabilityFetcher {
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .expect("client should build");
    let tls_connector = init_tls_connector().expect("TLS connector should build");
    CapabilityFetcher::new(client, tls_connector)
}

fn self_signed_identity() -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).expect("RSA key")).expect("private key");

    let mut name = X509NameBuilder::new().expect("name builder");
    name.append_entry_by_text("CN", "localhost").expect("common name");
    let name = name.build();

    let serial = BigNum::from_u32(1)
        .and_then(|serial| serial.to_asn1_integer())
        .expect("serial number");
    let not_before = Asn1Time::days_from_now(0).expect("not before");
    let not_after = Asn1Time::days_from_now(1).expect("not after");

    let mut cert = X509::builder().expect("certificate builder");
    cert.set_version(2).expect("version");
    cert.set_serial_number(&serial).expect("serial");
    cert.set_subject_name(&name).expect("subject");
    cert.set_issuer_name(&name).expect("issuer");
    cert.set_pubkey(&key).expect("public key");
    cert.set_not_before(&not_before).expect("validity start");
    cert.set_not_after(&not_after).expect("validity end");
    cert.sign(&key, MessageDigest::sha256()).expect("sign");
    (key, cert.build())
}

fn serve_once(acceptor: &SslAcceptor, stream: TcpStream, body: &str) {
    // Handshake-only connections close without sending a request
    let Ok(mut tls) = acceptor.accept(stream) else {
        return;
    };
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n".as_slice()) {
        match tls.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/fhir+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = tls.write_all(response.as_bytes());
    let _ = tls.shutdown();
}

/// Starts an HTTPS server on 127.0.0.1 with a self-signed certificate that
/// only negotiates `min_version` through `max_version`, and answers every
/// request with `body` as FHIR JSON. Returns its port.
#[allow(dead_code)]
pub fn start_tls_server(min_version: SslVersion, max_version: SslVersion, body: String) -> u16 {
    let (key, cert) = self_signed_identity();
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).expect("acceptor");
    builder.set_private_key(&key).expect("private key");
    builder.set_certificate(&cert).expect("certificate");
    // The Mozilla profile disables TLS 1.0/1.1; the version bounds decide instead
    builder.clear_options(SslOptions::NO_TLSV1 | SslOptions::NO_TLSV1_1);
    builder.set_min_proto_version(Some(min_version)).expect("min version");
    builder.set_max_proto_version(Some(max_version)).expect("max version");
    builder.set_cipher_list("ALL:@SECLEVEL=0").expect("cipher list");
    let acceptor = Arc::new(builder.build());

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let acceptor = Arc::clone(&acceptor);
            let body = body.clone();
            thread::spawn(move || serve_once(&acceptor, stream, &body));
        }
    });
    port
}

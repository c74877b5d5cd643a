//! Configuration constants.
//!
//! This module defines the constants used throughout the probe and validation
//! pipeline: network timeouts, well-known paths, and the conformance targets
//! the rule sets check against.

// Network operation timeouts
/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds (TLS version negotiation probe)
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds (TLS version negotiation probe)
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str = concat!("capability_status/", env!("CARGO_PKG_VERSION"));

/// Default destination name for capability statement messages.
pub const DEFAULT_QUEUE_NAME: &str = "capability-statements";

// Well-known paths
/// Path segment every FHIR base URL serves its capability statement from
pub const METADATA_PATH: &str = "/metadata";
/// Path (relative to the FHIR base URL) of the SMART configuration document
pub const SMART_CONFIGURATION_PATH: &str = "/.well-known/smart-configuration";

// Conformance targets
/// FHIR version the ONC certification criteria require
pub const REQUIRED_FHIR_VERSION: &str = "4.0.1";
/// FHIR version assumed when the capability statement does not declare one
pub const DEFAULT_FHIR_VERSION: &str = REQUIRED_FHIR_VERSION;
/// FHIR versions (DSTU2 and earlier) that use the legacy JSON MIME type
pub const DSTU2_FHIR_VERSIONS: &[&str] = &["0.4.0", "0.5.0", "1.0.0", "1.0.1", "1.0.2"];
/// Implementation guide tag attached to R4 rules
pub const US_CORE_IMPLEMENTATION_GUIDE: &str = "USCore 3.1";

/// Resource types, besides Patient, that carry a US Core profile.
pub const US_CORE_PROFILES: &[&str] = &[
    "AllergyIntolerance",
    "CarePlan",
    "CareTeam",
    "Condition",
    "DiagnosticReport",
    "DocumentReference",
    "Encounter",
    "Goal",
    "Immunization",
    "Device",
    "Observation",
    "Location",
    "Medication",
    "MedicationRequest",
    "Organization",
    "Practitioner",
    "PractitionerRole",
    "Procedure",
    "Provenance",
];

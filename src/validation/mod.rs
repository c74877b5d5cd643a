//! Rule-based validation of capability statements.
//!
//! Every rule set implements [`Validator`]. The base rule set holds the
//! shared behaviour; guide-specific rule sets (currently R4 / US Core 3.1)
//! wrap it, delegate, and override rule metadata. [`ValidatorRegistry`]
//! picks the rule set for a FHIR version.
//!
//! Validation never fails: a malformed document yields failing rules with
//! descriptive comments, not errors.

mod base;
mod r4;
mod resources;
mod rule;


use log::debug;

use crate::capability::CapabilityDocument;
use crate::fetch::MimeType;
use crate::probe::ProbeResult;
use crate::tls::TlsVersion;

pub use base::BaseValidation;
pub use r4::R4Validation;
pub use rule::{Rule, RuleName, Validation};

/// Everything the rules look at for one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    pub capability_statement: Option<CapabilityDocument<'a>>,
    /// HTTP status of the capability statement request
    pub http_response: u16,
    pub mime_types: &'a [MimeType],
    /// FHIR version the endpoint is validated as
    pub fhir_version: &'a str,
    pub tls_version: TlsVersion,
    /// HTTP status of the SMART configuration request (0 when not attempted)
    pub smart_http_response: u16,
}

impl<'a> ValidationInput<'a> {
    /// Builds the input from a probe result.
    ///
    /// The FHIR version declared by the capability statement wins; the
    /// `fallback_version` is used when the statement does not declare one.
    pub fn from_probe(
        result: &'a ProbeResult,
        fallback_version: &'a str,
        smart_http_response: u16,
    ) -> Self {
        let capability_statement = result.capability_document();
        let fhir_version = capability_statement
            .and_then(|doc| doc.fhir_version().present())
            .unwrap_or(fallback_version);
        Self {
            capability_statement,
            http_response: result.http_status,
            mime_types: &result.supported_mime_types,
            fhir_version,
            tls_version: result.tls_version,
            smart_http_response,
        }
    }
}

/// A rule set for one implementation guide.
///
/// Each check is a pure function of its arguments. `run_validation` calls
/// the checks the guide requires, in the guide's order, without
/// short-circuiting.
pub trait Validator: Send + Sync {
    /// Runs every rule of this set.
    fn run_validation(&self, input: &ValidationInput<'_>) -> Validation;

    fn cap_stat_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn mime_type_valid(&self, mime_types: &[MimeType], fhir_version: &str) -> Rule;
    fn http_response_valid(&self, http_response: u16) -> Rule;
    fn fhir_version(&self, fhir_version: &str) -> Rule;
    fn tls_version(&self, tls_version: TlsVersion) -> Rule;
    fn patient_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn other_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn smart_http_response_valid(&self, smart_http_response: u16) -> Rule;

    /// Returns the kind rule and the instance rule, in that order.
    fn kind_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> [Rule; 2];

    fn messaging_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn endpoint_function_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn describe_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn document_set_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn unique_resources(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
    fn search_params_unique(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule;
}

/// Rule sets keyed by FHIR version prefix.
pub struct ValidatorRegistry {
    entries: Vec<(String, Box<dyn Validator>)>,
    fallback: Box<dyn Validator>,
}

impl ValidatorRegistry {
    /// A registry that only knows the fallback rule set.
    pub fn new(fallback: Box<dyn Validator>) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    /// Registers `validator` for FHIR versions starting with `version_prefix`.
    /// Earlier registrations take precedence.
    pub fn register(&mut self, version_prefix: impl Into<String>, validator: Box<dyn Validator>) {
        self.entries.push((version_prefix.into(), validator));
    }

    /// The rule set for `fhir_version`.
    pub fn validator_for(&self, fhir_version: &str) -> &dyn Validator {
        self.entries
            .iter()
            .find(|(prefix, _)| fhir_version.starts_with(prefix.as_str()))
            .map_or(self.fallback.as_ref(), |(_, validator)| validator.as_ref())
    }

    pub fn run_validation(&self, input: &ValidationInput<'_>) -> Validation {
        debug!("Validating against rule set for FHIR version {}", input.fhir_version);
        self.validator_for(input.fhir_version).run_validation(input)
    }
}

impl Default for ValidatorRegistry {
    /// R4 rules for `4.x`, base rules otherwise.
    fn default() -> Self {
        let mut registry = Self::new(Box::new(BaseValidation));
        registry.register("4.", Box::new(R4Validation::new()));
        registry
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field(
                "prefixes",
                &self.entries.iter().map(|(prefix, _)| prefix).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Validates one endpoint with the default registry.
pub fn run_validation_checks(input: &ValidationInput<'_>) -> Validation {
    ValidatorRegistry::default().run_validation(input)
}

//! FHIR R4 rules, as profiled by US Core 3.1.

use crate::capability::CapabilityDocument;
use crate::config::{US_CORE_IMPLEMENTATION_GUIDE, US_CORE_PROFILES};
use crate::fetch::MimeType;
use crate::tls::TlsVersion;
use crate::validation::base::{BaseValidation, HTTP_REFERENCE};
use crate::validation::rule::{Rule, Validation};
use crate::validation::{ValidationInput, Validator};

const US_CORE_SERVER_REFERENCE: &str =
    "https://www.hl7.org/fhir/us/core/CapabilityStatement-us-core-server.html";
const US_CORE_SECURITY_REFERENCE: &str = "https://www.hl7.org/fhir/us/core/security.html";
const PATIENT_COMMENT: &str =
    "The US Core Server SHALL support the US Core Patient resource profile.";
const OTHER_RESOURCE_COMMENT: &str = "The US Core Server SHALL support at least one additional resource profile (besides Patient) from the list of US Core Profiles. ";
const SMART_REFERENCE: &str = "http://www.hl7.org/fhir/smart-app-launch/conformance/index.html";

/// US Core 3.1 rule set. Delegates every check to [`BaseValidation`] and
/// attaches the guide's references and requirement texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct R4Validation {
    base: BaseValidation,
}

impl R4Validation {
    pub fn new() -> Self {
        Self::default()
    }
}

fn us_core(rule: Rule) -> Rule {
    rule.with_guide(US_CORE_IMPLEMENTATION_GUIDE)
}

impl Validator for R4Validation {
    fn run_validation(&self, input: &ValidationInput<'_>) -> Validation {
        let doc = input.capability_statement.as_ref();
        let [kind, instance] = self.kind_valid(doc);
        Validation {
            results: vec![
                self.cap_stat_exists(doc),
                self.mime_type_valid(input.mime_types, input.fhir_version),
                self.http_response_valid(input.http_response),
                self.fhir_version(input.fhir_version),
                self.tls_version(input.tls_version),
                self.patient_resource_exists(doc),
                self.other_resource_exists(doc),
                self.smart_http_response_valid(input.smart_http_response),
                kind,
                instance,
                self.messaging_endpoint_valid(doc),
                self.endpoint_function_valid(doc),
                self.describe_endpoint_valid(doc),
                self.document_set_valid(doc),
                self.unique_resources(doc),
                self.search_params_unique(doc),
            ],
            warnings: Vec::new(),
        }
    }

    fn cap_stat_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.cap_stat_exists(doc))
            .with_comment(
                "Servers SHALL provide a Capability Statement that specifies which interactions and resources are supported.",
            )
            .with_reference(HTTP_REFERENCE)
    }

    fn mime_type_valid(&self, mime_types: &[MimeType], fhir_version: &str) -> Rule {
        us_core(self.base.mime_type_valid(mime_types, fhir_version))
    }

    fn http_response_valid(&self, http_response: u16) -> Rule {
        us_core(self.base.http_response_valid(http_response))
    }

    fn fhir_version(&self, fhir_version: &str) -> Rule {
        us_core(self.base.fhir_version(fhir_version))
    }

    fn tls_version(&self, tls_version: TlsVersion) -> Rule {
        us_core(self.base.tls_version(tls_version)).with_reference(US_CORE_SECURITY_REFERENCE)
    }

    fn patient_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(BaseValidation::patient_resource_rule(doc, PATIENT_COMMENT))
            .with_reference(US_CORE_SERVER_REFERENCE)
    }

    fn other_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let profiled = |resource_type: &str| US_CORE_PROFILES.contains(&resource_type);
        us_core(BaseValidation::other_resource_rule(doc, profiled, OTHER_RESOURCE_COMMENT))
            .with_reference(US_CORE_SERVER_REFERENCE)
    }

    fn smart_http_response_valid(&self, smart_http_response: u16) -> Rule {
        us_core(self.base.smart_http_response_valid(smart_http_response))
            .with_reference(SMART_REFERENCE)
    }

    fn kind_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> [Rule; 2] {
        self.base.kind_valid(doc).map(us_core)
    }

    fn messaging_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.messaging_endpoint_valid(doc))
    }

    fn endpoint_function_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.endpoint_function_valid(doc))
    }

    fn describe_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.describe_endpoint_valid(doc))
    }

    fn document_set_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.document_set_valid(doc))
    }

    fn unique_resources(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.unique_resources(doc))
    }

    fn search_params_unique(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        us_core(self.base.search_params_unique(doc))
    }
}

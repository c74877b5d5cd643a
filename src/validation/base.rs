//! Rules shared by every implementation guide.

use crate::capability::{string_entry, CapabilityDocument, Field, JsonObject};
use crate::config::REQUIRED_FHIR_VERSION;
use crate::fetch::MimeType;
use crate::probe::NO_HTTP_RESPONSE;
use crate::tls::TlsVersion;
use crate::validation::resources::{
    any_resource_type, first_duplicate_resource_type, search_param_comments, StructuralFailure,
};
use crate::validation::rule::{Rule, RuleName, Validation};
use crate::validation::{ValidationInput, Validator};

pub(crate) const HTTP_REFERENCE: &str = "http://hl7.org/fhir/http.html";
pub(crate) const CAPABILITY_STATEMENT_REFERENCE: &str =
    "http://hl7.org/fhir/capabilitystatement.html";
const ONC_CRITERIA_REFERENCE: &str =
    "https://www.healthit.gov/cures/sites/default/files/cures/2020-03/APICertificationCriterion.pdf";

const HTTP_COMMENT: &str =
    "Applications SHALL return a resource that describes the functionality of the server end-point.";
const SMART_COMMENT: &str = "FHIR endpoints requiring authorization SHALL serve a JSON document at the location formed by appending /.well-known/smart-configuration to their base URL.";
const PATIENT_COMMENT: &str = "Servers should declare support for the Patient resource.";
const OTHER_RESOURCE_COMMENT: &str =
    "Servers should declare support for at least one resource besides Patient. ";
const KIND_COMMENT: &str =
    "Kind value should be set to 'instance' because this is a specific system instance.";
const INSTANCE_COMMENT: &str =
    "If kind = instance, implementation must be present. This endpoint must be an instance.";
const MESSAGING_COMMENT: &str = "Messaging end-point is required (and is only permitted) when a statement is for an implementation. This endpoint must be an implementation.";
const DOCUMENT_COMMENT: &str =
    "The set of documents must be unique by the combination of profile and mode.";
const DOCUMENT_MALFORMED_COMMENT: &str =
    "Document field is not formatted correctly. Cannot check if the set of documents are unique. ";

/// Guide-independent rule set, used for FHIR versions without a dedicated
/// guide (DSTU2, STU3) and wrapped by the guide-specific sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseValidation;

impl BaseValidation {
    /// Status rule shared by the capability statement and SMART requests.
    ///
    /// `NO_HTTP_RESPONSE` means the request was not attempted and passes.
    fn status_rule(rule_name: RuleName, status: u16, comment: &str) -> Rule {
        let mut rule = Rule::new(rule_name);
        rule.expected = "200".to_string();
        rule.actual = status.to_string();
        if status == NO_HTTP_RESPONSE || status == 200 {
            rule.comment = comment.to_string();
        } else {
            rule.valid = false;
            rule.comment = format!("The HTTP response code was {status} instead of 200. {comment}");
        }
        rule
    }

    /// Resource-list rule that fails on a structural problem and otherwise
    /// takes its outcome from `check`.
    fn resource_rule(
        rule_name: RuleName,
        base_comment: &str,
        check: Result<Option<String>, StructuralFailure>,
    ) -> Rule {
        let mut rule = Rule::new(rule_name);
        match check {
            Ok(None) => rule.comment = base_comment.to_string(),
            Ok(Some(reason)) => {
                rule.fail();
                rule.comment = format!("{reason}{base_comment}");
            }
            Err(failure) => {
                rule.fail();
                rule.comment = format!("{}{base_comment}", failure.comment());
            }
        }
        rule
    }

    /// Names of the candidate fields that are present and non-empty.
    fn present_fields(candidates: [(&'static str, bool); 3]) -> Vec<&'static str> {
        candidates
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    /// Patient resource rule carrying a guide's requirement text.
    pub(crate) fn patient_resource_rule(doc: Option<&CapabilityDocument<'_>>, requirement: &str) -> Rule {
        let check = any_resource_type(doc, |resource_type| resource_type == "Patient")
            .map(|found| (!found).then(String::new));
        Self::resource_rule(RuleName::PatResourceExists, requirement, check)
    }

    /// Passes when some declared resource type satisfies `counts`.
    pub(crate) fn other_resource_rule(
        doc: Option<&CapabilityDocument<'_>>,
        counts: impl Fn(&str) -> bool,
        requirement: &str,
    ) -> Rule {
        let check = any_resource_type(doc, counts).map(|found| (!found).then(String::new));
        Self::resource_rule(RuleName::OtherResourceExists, requirement, check)
    }

    fn at_least_one_rule(rule_name: RuleName, expected: &str, comment: &str, present: Vec<&str>) -> Rule {
        let mut rule = Rule::new(rule_name);
        rule.expected = expected.to_string();
        rule.actual = present.join(",");
        rule.comment = comment.to_string();
        rule.valid = !present.is_empty();
        rule
    }
}

fn non_empty_object(field: Field<&JsonObject>) -> bool {
    field.present().is_some_and(|object| !object.is_empty())
}

fn non_empty_list<T>(field: Field<Vec<T>>) -> bool {
    field.present().is_some_and(|items| !items.is_empty())
}

impl Validator for BaseValidation {
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
                kind,
                instance,
            ],
            warnings: Vec::new(),
        }
    }

    fn cap_stat_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let mut rule = Rule::new(RuleName::CapStatExist);
        if doc.is_none() {
            rule.fail();
            rule.comment = "The Capability Statement does not exist.".to_string();
        }
        rule
    }

    fn mime_type_valid(&self, mime_types: &[MimeType], fhir_version: &str) -> Rule {
        let required = MimeType::for_fhir_version(fhir_version);
        let mut rule = Rule::new(RuleName::GeneralMimeType)
            .with_comment(format!(
                "FHIR Version {fhir_version} requires the Mime Type to be {required}"
            ))
            .with_reference(HTTP_REFERENCE);
        rule.expected = required.to_string();
        rule.actual = mime_types
            .iter()
            .map(|mime_type| mime_type.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        rule.valid = mime_types.contains(&required);
        rule
    }

    fn http_response_valid(&self, http_response: u16) -> Rule {
        Self::status_rule(RuleName::HttpResponse, http_response, HTTP_COMMENT)
            .with_reference(HTTP_REFERENCE)
    }

    fn fhir_version(&self, fhir_version: &str) -> Rule {
        let mut rule = Rule::new(RuleName::FhirVersion)
            .with_comment(format!(
                "ONC Certification Criteria requires support of FHIR Version {REQUIRED_FHIR_VERSION}"
            ))
            .with_reference(ONC_CRITERIA_REFERENCE);
        rule.expected = REQUIRED_FHIR_VERSION.to_string();
        rule.actual = fhir_version.to_string();
        rule.valid = fhir_version == REQUIRED_FHIR_VERSION;
        rule
    }

    fn tls_version(&self, tls_version: TlsVersion) -> Rule {
        let mut rule = Rule::new(RuleName::TlsVersion).with_comment(
            "Systems SHALL use TLS version 1.2 or higher for all transmissions not taking place over a secure network connection.",
        );
        rule.expected = format!("{}, {}", TlsVersion::Tls12, TlsVersion::Tls13);
        rule.actual = tls_version.to_string();
        rule.valid = tls_version.is_modern();
        rule
    }

    fn patient_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        Self::patient_resource_rule(doc, PATIENT_COMMENT)
    }

    fn other_resource_exists(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        Self::other_resource_rule(doc, |resource_type| resource_type != "Patient", OTHER_RESOURCE_COMMENT)
    }

    fn smart_http_response_valid(&self, smart_http_response: u16) -> Rule {
        let mut rule = Self::status_rule(RuleName::SmartHttpResponse, smart_http_response, HTTP_COMMENT);
        rule.comment = if rule.valid {
            SMART_COMMENT.to_string()
        } else {
            format!("{} {SMART_COMMENT}", rule.comment)
        };
        rule
    }

    fn kind_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> [Rule; 2] {
        let mut kind = Rule::new(RuleName::KindRule).with_reference(CAPABILITY_STATEMENT_REFERENCE);
        kind.expected = "instance".to_string();
        let kind_field = doc.map_or(Field::Absent, |doc| doc.kind());
        match kind_field {
            Field::Present(value) => {
                kind.actual = value.to_string();
                kind.valid = value == "instance";
                kind.comment = KIND_COMMENT.to_string();
            }
            Field::Absent => {
                kind.actual = String::new();
                kind.valid = false;
                kind.comment = format!("Kind field does not exist. {KIND_COMMENT}");
            }
            Field::Malformed => {
                kind.actual = String::new();
                kind.valid = false;
                kind.comment = format!("Kind field is not formatted correctly. {KIND_COMMENT}");
            }
        }

        let mut instance = Rule::new(RuleName::InstanceRule)
            .with_comment(INSTANCE_COMMENT)
            .with_reference(CAPABILITY_STATEMENT_REFERENCE);
        if !doc.is_some_and(|doc| non_empty_object(doc.implementation())) {
            instance.fail();
        }

        [kind, instance]
    }

    fn messaging_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let mut rule = Rule::new(RuleName::MessagingEndptRule)
            .with_comment(MESSAGING_COMMENT)
            .with_reference(CAPABILITY_STATEMENT_REFERENCE);

        let [kind, _] = self.kind_valid(doc);
        if !kind.valid {
            rule.fail();
            rule.comment = format!("{} {MESSAGING_COMMENT}", kind.comment);
            return rule;
        }

        let Some(doc) = doc else {
            rule.fail();
            return rule;
        };
        let Field::Present(messaging) = doc.messaging() else {
            rule.fail();
            rule.comment = format!("Messaging does not exist. {MESSAGING_COMMENT}");
            return rule;
        };
        let every_block_has_endpoint = messaging.into_iter().all(|block| {
            doc.messaging_endpoints(block)
                .present()
                .is_some_and(|endpoints| !endpoints.is_empty())
        });
        if !every_block_has_endpoint {
            rule.fail();
            rule.comment = format!("Endpoint field in Messaging does not exist. {MESSAGING_COMMENT}");
        }
        rule
    }

    fn endpoint_function_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let present = doc.map_or_else(Vec::new, |doc| {
            Self::present_fields([
                ("rest", non_empty_list(doc.rest())),
                ("messaging", non_empty_list(doc.messaging())),
                ("document", non_empty_list(doc.document())),
            ])
        });
        Self::at_least_one_rule(
            RuleName::EndpointFunctionRule,
            "rest OR messaging OR document",
            "A Capability Statement SHALL have at least one of REST, messaging or document element.",
            present,
        )
        .with_reference(CAPABILITY_STATEMENT_REFERENCE)
    }

    fn describe_endpoint_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let present = doc.map_or_else(Vec::new, |doc| {
            Self::present_fields([
                (
                    "description",
                    doc.description().present().is_some_and(|d| !d.is_empty()),
                ),
                ("software", non_empty_object(doc.software())),
                ("implementation", non_empty_object(doc.implementation())),
            ])
        });
        Self::at_least_one_rule(
            RuleName::DescribeEndpointRule,
            "description OR software OR implementation",
            "A Capability Statement SHALL have at least one of description, software, or implementation element.",
            present,
        )
        .with_reference(CAPABILITY_STATEMENT_REFERENCE)
    }

    fn document_set_valid(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let mut rule = Rule::new(RuleName::DocumentValidRule)
            .with_comment(DOCUMENT_COMMENT)
            .with_reference(CAPABILITY_STATEMENT_REFERENCE);

        let documents = match doc.map_or(Field::Absent, |doc| doc.document()) {
            Field::Present(documents) => documents,
            Field::Absent => {
                rule.comment = "Document field does not exist.".to_string();
                return rule;
            }
            Field::Malformed => {
                rule.fail();
                rule.comment = format!("{DOCUMENT_MALFORMED_COMMENT}{DOCUMENT_COMMENT}");
                return rule;
            }
        };
        if documents.is_empty() {
            rule.comment = format!("No documents are declared. {DOCUMENT_COMMENT}");
            return rule;
        }

        let mut seen = std::collections::HashSet::new();
        for document in documents {
            let (Field::Present(mode), Field::Present(profile)) =
                (string_entry(document, "mode"), string_entry(document, "profile"))
            else {
                rule.fail();
                rule.comment = format!("{DOCUMENT_MALFORMED_COMMENT}{DOCUMENT_COMMENT}");
                return rule;
            };
            if !seen.insert(format!("{profile}.{mode}")) {
                rule.fail();
                rule.comment = format!("The set of documents are not unique. {DOCUMENT_COMMENT}");
                return rule;
            }
        }
        rule
    }

    fn unique_resources(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let check = first_duplicate_resource_type(doc).map(|duplicate| {
            duplicate.map(|resource_type| format!("The resource type {resource_type} is not unique. "))
        });
        Self::resource_rule(
            RuleName::UniqueResourcesRule,
            "A given resource can only be described once per RESTful mode.",
            check,
        )
        .with_reference(CAPABILITY_STATEMENT_REFERENCE)
    }

    fn search_params_unique(&self, doc: Option<&CapabilityDocument<'_>>) -> Rule {
        let check = search_param_comments(doc)
            .map(|comments| (!comments.is_empty()).then(|| comments.concat()));
        Self::resource_rule(
            RuleName::SearchParamsRule,
            "Search parameter names must be unique in the context of a resource.",
            check,
        )
        .with_reference(CAPABILITY_STATEMENT_REFERENCE)
    }
}

//! Rule and report types.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Identifier of a normative rule.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum RuleName {
    CapStatExist,
    GeneralMimeType,
    HttpResponse,
    FhirVersion,
    TlsVersion,
    PatResourceExists,
    OtherResourceExists,
    SmartHttpResponse,
    KindRule,
    InstanceRule,
    MessagingEndptRule,
    EndpointFunctionRule,
    DescribeEndpointRule,
    DocumentValidRule,
    UniqueResourcesRule,
    SearchParamsRule,
}

/// One evaluated normative statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub rule_name: RuleName,
    pub valid: bool,
    pub expected: String,
    pub actual: String,
    pub comment: String,
    /// URL of the normative source
    pub reference: String,
    pub implementation_guide: String,
}

impl Rule {
    /// A passing rule with `expected` and `actual` both `"true"`.
    pub(crate) fn new(rule_name: RuleName) -> Self {
        Self {
            rule_name,
            valid: true,
            expected: "true".to_string(),
            actual: "true".to_string(),
            comment: String::new(),
            reference: String::new(),
            implementation_guide: String::new(),
        }
    }

    /// Marks a boolean rule as failed.
    pub(crate) fn fail(&mut self) {
        self.valid = false;
        self.actual = "false".to_string();
    }

    pub(crate) fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub(crate) fn with_reference(mut self, reference: &str) -> Self {
        self.reference = reference.to_string();
        self
    }

    pub(crate) fn with_guide(mut self, implementation_guide: &str) -> Self {
        self.implementation_guide = implementation_guide.to_string();
        self
    }
}

/// Validation report for one capability statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// One entry per evaluated rule, in registration order
    pub results: Vec<Rule>,
    /// Advisory findings that do not affect conformance
    pub warnings: Vec<Rule>,
}

impl Validation {
    /// Whether every rule in `results` passed.
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|rule| rule.valid)
    }

    /// First result for `name`, if that rule was evaluated.
    pub fn rule(&self, name: RuleName) -> Option<&Rule> {
        self.results.iter().find(|rule| rule.rule_name == name)
    }

    /// Rules that failed, in order.
    pub fn failures(&self) -> impl Iterator<Item = &Rule> {
        self.results.iter().filter(|rule| !rule.valid)
    }
}

//! Resource-list traversal shared by the resource rules.
//!
//! Every resource rule walks `rest[].resource[]` in document order. The first
//! structural problem stops the walk for that rule.

use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::capability::{string_entry, CapabilityDocument, Field, JsonObject};

/// Structural problem that prevents a resource rule from being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StructuralFailure {
    NoCapabilityStatement,
    RestMissing,
    RestMalformed,
    ResourcesMissing,
    ResourceMalformed,
}

impl StructuralFailure {
    pub(crate) fn comment(self) -> &'static str {
        match self {
            StructuralFailure::NoCapabilityStatement => {
                "The Capability Statement does not exist; cannot check resource profiles. "
            }
            StructuralFailure::RestMissing => "Rest field does not exist. ",
            StructuralFailure::RestMalformed => "Rest field is not formatted correctly. ",
            StructuralFailure::ResourcesMissing => "The Resource Profiles do not exist. ",
            StructuralFailure::ResourceMalformed => {
                "The Resource Profiles are not properly formatted. "
            }
        }
    }
}

/// Calls `visit` with every resource and its `type`, across all REST blocks.
///
/// Returns `Ok(ControlFlow::Break(()))` if `visit` stopped the walk,
/// `Ok(ControlFlow::Continue(()))` if every resource was visited.
pub(crate) fn walk_resources<'a>(
    doc: Option<&CapabilityDocument<'a>>,
    mut visit: impl FnMut(&'a JsonObject, &'a str) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, StructuralFailure> {
    let doc = doc.ok_or(StructuralFailure::NoCapabilityStatement)?;
    let rest = match doc.rest() {
        Field::Present(rest) => rest,
        Field::Absent => return Err(StructuralFailure::RestMissing),
        Field::Malformed => return Err(StructuralFailure::RestMalformed),
    };

    for rest_elem in rest {
        let resources = match doc.resources(rest_elem) {
            Field::Present(resources) if !resources.is_empty() => resources,
            _ => return Err(StructuralFailure::ResourcesMissing),
        };
        for resource in resources {
            let resource_type = string_entry(resource, "type")
                .present()
                .ok_or(StructuralFailure::ResourceMalformed)?;
            if visit(resource, resource_type).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
    }

    Ok(ControlFlow::Continue(()))
}

/// Whether any resource has a `type` satisfying `predicate`.
pub(crate) fn any_resource_type(
    doc: Option<&CapabilityDocument<'_>>,
    predicate: impl Fn(&str) -> bool,
) -> Result<bool, StructuralFailure> {
    let flow = walk_resources(doc, |_, resource_type| {
        if predicate(resource_type) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(flow.is_break())
}

/// First resource type that appears more than once, in iteration order.
pub(crate) fn first_duplicate_resource_type<'a>(
    doc: Option<&CapabilityDocument<'a>>,
) -> Result<Option<&'a str>, StructuralFailure> {
    let mut seen = HashSet::new();
    let mut duplicate = None;
    walk_resources(doc, |_, resource_type| {
        if seen.insert(resource_type) {
            ControlFlow::Continue(())
        } else {
            duplicate = Some(resource_type);
            ControlFlow::Break(())
        }
    })?;
    Ok(duplicate)
}

/// Problem with one resource's `searchParam` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchParamProblem {
    /// The list or one of its entries is not shaped as expected.
    Malformed,
    /// Two entries share a name.
    Duplicate,
}

/// Checks that every search parameter of `resource` has a unique string name.
pub(crate) fn check_search_params<'a>(
    doc: &CapabilityDocument<'a>,
    resource: &'a JsonObject,
) -> Result<(), SearchParamProblem> {
    let params = match doc.search_params(resource) {
        Field::Present(params) => params,
        Field::Absent => return Ok(()),
        Field::Malformed => return Err(SearchParamProblem::Malformed),
    };

    let mut names = HashSet::new();
    for param in params {
        let name = string_entry(param, "name")
            .present()
            .ok_or(SearchParamProblem::Malformed)?;
        if !names.insert(name) {
            return Err(SearchParamProblem::Duplicate);
        }
    }
    Ok(())
}

/// Checks search parameters of every resource, collecting one comment per
/// offending resource. Unlike the other walks, a bad resource does not stop
/// the check of its siblings.
pub(crate) fn search_param_comments<'a>(
    doc: Option<&CapabilityDocument<'a>>,
) -> Result<Vec<String>, StructuralFailure> {
    let doc = doc.ok_or(StructuralFailure::NoCapabilityStatement)?;
    let mut comments = Vec::new();
    walk_resources(Some(doc), |resource, resource_type| {
        match check_search_params(doc, resource) {
            Ok(()) => {}
            Err(SearchParamProblem::Malformed) => comments.push(format!(
                "The resource type {resource_type} is not formatted properly. "
            )),
            Err(SearchParamProblem::Duplicate) => comments.push(format!(
                "The resource type {resource_type} does not have unique searchParams. "
            )),
        }
        ControlFlow::Continue(())
    })?;
    Ok(comments)
}

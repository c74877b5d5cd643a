//! Capability statement parsing.
//!
//! A capability statement is only partially trustworthy: any field may be
//! missing, `null`, or of the wrong JSON type. Every accessor therefore
//! returns a [`Field`] that distinguishes "absent" from "present but
//! malformed" from "present and well-typed", and never panics.

use serde_json::{Map, Value};

use crate::error_handling::ParseError;

/// JSON object as found inside a capability statement.
pub type JsonObject = Map<String, Value>;

/// Outcome of reading one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<T> {
    /// Present and of the expected shape.
    Present(T),
    /// Present but of the wrong JSON type.
    Malformed,
    /// Missing or `null`.
    Absent,
}

impl<T> Field<T> {
    /// The value, if present and well-typed.
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Malformed | Field::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Present(value) => Field::Present(f(value)),
            Field::Malformed => Field::Malformed,
            Field::Absent => Field::Absent,
        }
    }
}

/// Reads `key` from `object`, treating `null` as absent.
fn entry<'a>(object: &'a JsonObject, key: &str) -> Field<&'a Value> {
    match object.get(key) {
        None | Some(Value::Null) => Field::Absent,
        Some(value) => Field::Present(value),
    }
}

/// Reads a string-valued entry.
pub fn string_entry<'a>(object: &'a JsonObject, key: &str) -> Field<&'a str> {
    match entry(object, key) {
        Field::Present(Value::String(s)) => Field::Present(s.as_str()),
        Field::Present(_) | Field::Malformed => Field::Malformed,
        Field::Absent => Field::Absent,
    }
}

/// Reads an object-valued entry.
pub fn object_entry<'a>(object: &'a JsonObject, key: &str) -> Field<&'a JsonObject> {
    match entry(object, key) {
        Field::Present(Value::Object(map)) => Field::Present(map),
        Field::Present(_) | Field::Malformed => Field::Malformed,
        Field::Absent => Field::Absent,
    }
}

/// Reads an array-valued entry without constraining its elements.
pub fn array_entry<'a>(object: &'a JsonObject, key: &str) -> Field<&'a [Value]> {
    match entry(object, key) {
        Field::Present(Value::Array(items)) => Field::Present(items.as_slice()),
        Field::Present(_) | Field::Malformed => Field::Malformed,
        Field::Absent => Field::Absent,
    }
}

/// Reads an array entry whose elements must all be objects.
///
/// A single non-object element makes the whole list malformed.
pub fn object_list_entry<'a>(object: &'a JsonObject, key: &str) -> Field<Vec<&'a JsonObject>> {
    match array_entry(object, key) {
        Field::Present(items) => items
            .iter()
            .map(Value::as_object)
            .collect::<Option<Vec<_>>>()
            .map_or(Field::Malformed, Field::Present),
        Field::Malformed => Field::Malformed,
        Field::Absent => Field::Absent,
    }
}

/// Read-only view over a parsed capability statement (or DSTU2 conformance
/// statement; both share the same field layout).
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDocument<'a> {
    root: &'a JsonObject,
}

impl<'a> CapabilityDocument<'a> {
    /// Wraps a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::NotAnObject` if the top-level value is not a
    /// JSON object.
    pub fn new(value: &'a Value) -> Result<Self, ParseError> {
        value
            .as_object()
            .map(|root| Self { root })
            .ok_or(ParseError::NotAnObject)
    }

    /// The underlying JSON object.
    pub fn as_object(&self) -> &'a JsonObject {
        self.root
    }

    /// `rest[]`: RESTful interaction blocks.
    pub fn rest(&self) -> Field<Vec<&'a JsonObject>> {
        object_list_entry(self.root, "rest")
    }

    /// `rest[].resource[]` of one REST block.
    pub fn resources(&self, rest: &'a JsonObject) -> Field<Vec<&'a JsonObject>> {
        object_list_entry(rest, "resource")
    }

    /// `rest[].resource[].searchParam[]` of one resource.
    pub fn search_params(&self, resource: &'a JsonObject) -> Field<Vec<&'a JsonObject>> {
        object_list_entry(resource, "searchParam")
    }

    /// `messaging[]`: messaging blocks.
    pub fn messaging(&self) -> Field<Vec<&'a JsonObject>> {
        object_list_entry(self.root, "messaging")
    }

    /// `messaging[].endpoint[]` of one messaging block.
    pub fn messaging_endpoints(&self, messaging: &'a JsonObject) -> Field<&'a [Value]> {
        array_entry(messaging, "endpoint")
    }

    /// `document[]`: document blocks.
    pub fn document(&self) -> Field<Vec<&'a JsonObject>> {
        object_list_entry(self.root, "document")
    }

    pub fn implementation(&self) -> Field<&'a JsonObject> {
        object_entry(self.root, "implementation")
    }

    pub fn software(&self) -> Field<&'a JsonObject> {
        object_entry(self.root, "software")
    }

    pub fn description(&self) -> Field<&'a str> {
        string_entry(self.root, "description")
    }

    pub fn kind(&self) -> Field<&'a str> {
        string_entry(self.root, "kind")
    }

    pub fn fhir_version(&self) -> Field<&'a str> {
        string_entry(self.root, "fhirVersion")
    }
}

/// Parses a response body into a JSON value.
///
/// # Errors
///
/// Returns `ParseError::InvalidJson` if the body is not valid JSON.
pub fn parse_capability_statement(body: &[u8]) -> Result<Value, ParseError> {
    Ok(serde_json::from_slice(body)?)
}

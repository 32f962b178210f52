//! Schema validation against a static field descriptor.
//!
//! A descriptor lists the required fields of one reply kind and the shape
//! each must have. Most replies are a single object; some are a top-level
//! array of objects, in which case every element is checked against the
//! field list. Validation walks the whole list and collects every violation
//! before failing, so one bad reply produces one complete error message
//! instead of one message per retry.

use crate::error::{ExtractError, Violation};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Expected shape of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldShape {
    /// String, number or bool.
    Scalar,
    /// Any JSON array.
    Array,
    /// Any JSON object.
    Object,
    /// An array whose elements are all objects.
    ObjectArray,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldShape::Scalar => "scalar",
            FieldShape::Array => "array",
            FieldShape::Object => "object",
            FieldShape::ObjectArray => "array of objects",
        };
        f.write_str(s)
    }
}

/// One required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: FieldShape,
}

impl FieldSpec {
    pub const fn new(name: &'static str, shape: FieldShape) -> Self {
        Self { name, shape }
    }
}

/// Top-level shape of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RootShape {
    /// A single object holding the fields.
    Object,
    /// An array whose every element is an object holding the fields.
    ObjectArray,
}

impl fmt::Display for RootShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootShape::Object => "object",
            RootShape::ObjectArray => "array of objects",
        };
        f.write_str(s)
    }
}

/// Ordered list of required fields for one kind of reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub root: RootShape,
    pub fields: &'static [FieldSpec],
}

impl SchemaDescriptor {
    /// Descriptor for a reply that is one object.
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            root: RootShape::Object,
            fields,
        }
    }

    /// Descriptor for a reply that is a top-level array of objects.
    pub const fn array_of(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            root: RootShape::ObjectArray,
            fields,
        }
    }
}

/// Check `value` against `schema`, handing the value back on success.
///
/// For an array root, violations inside element `i` are reported with the
/// field path `[i].name`. `raw` is carried into the error for diagnostics
/// only.
pub fn validate(value: Value, schema: &SchemaDescriptor, raw: &str) -> Result<Value, ExtractError> {
    let violations: Vec<Violation> = match (schema.root, &value) {
        (RootShape::Object, Value::Object(map)) => check_fields(map, schema.fields, ""),
        (RootShape::ObjectArray, Value::Array(items)) => items
            .iter()
            .enumerate()
            .flat_map(|(i, item)| match item {
                Value::Object(map) => check_fields(map, schema.fields, &format!("[{i}].")),
                other => vec![Violation::WrongShape {
                    field: format!("[{i}]"),
                    expected: "object".to_string(),
                    found: describe(other),
                }],
            })
            .collect(),
        (RootShape::Object, other) => vec![Violation::NotAnObject {
            found: describe(other),
        }],
        (RootShape::ObjectArray, other) => vec![Violation::NotAnArray {
            found: describe(other),
        }],
    };

    if violations.is_empty() {
        Ok(value)
    } else {
        Err(mismatch(schema, violations, raw))
    }
}

fn check_fields(map: &Map<String, Value>, fields: &[FieldSpec], prefix: &str) -> Vec<Violation> {
    fields
        .iter()
        .filter_map(|spec| check_field(map, spec, prefix))
        .collect()
}

fn check_field(map: &Map<String, Value>, spec: &FieldSpec, prefix: &str) -> Option<Violation> {
    let field = || format!("{prefix}{}", spec.name);
    let value = match map.get(spec.name) {
        None | Some(Value::Null) => return Some(Violation::Missing { field: field() }),
        Some(v) => v,
    };

    let found = match (spec.shape, value) {
        (FieldShape::Scalar, Value::String(_) | Value::Number(_) | Value::Bool(_)) => None,
        (FieldShape::Array, Value::Array(_)) => None,
        (FieldShape::Object, Value::Object(_)) => None,
        (FieldShape::ObjectArray, Value::Array(items)) => items
            .iter()
            .position(|item| !item.is_object())
            .map(|i| format!("{} at index {}", describe(&items[i]), i)),
        (_, other) => Some(describe(other)),
    };

    found.map(|found| Violation::WrongShape {
        field: field(),
        expected: spec.shape.to_string(),
        found,
    })
}

fn mismatch(schema: &SchemaDescriptor, violations: Vec<Violation>, raw: &str) -> ExtractError {
    ExtractError::SchemaMismatch {
        schema: schema.name.to_string(),
        violations,
        raw: raw.to_string(),
    }
}

/// Human name of a JSON value's type.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ABC: SchemaDescriptor = SchemaDescriptor::new(
        "abc",
        &[
            FieldSpec::new("A", FieldShape::Scalar),
            FieldSpec::new("B", FieldShape::Array),
            FieldSpec::new("C", FieldShape::Object),
        ],
    );

    #[test]
    fn valid_object_passes() {
        let value = validate(json!({"A": "x", "B": [], "C": {}}), &ABC, "").unwrap();
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn collects_all_missing_fields() {
        let err = validate(json!({"B": [1]}), &ABC, "raw").unwrap_err();
        let fields: Vec<_> = err.violations().iter().filter_map(Violation::field).collect();
        assert_eq!(fields, vec!["A", "C"]);
        let msg = err.to_string();
        assert!(msg.contains("A (missing)") && msg.contains("C (missing)"), "got: {msg}");
    }

    #[test]
    fn null_counts_as_missing() {
        let err = validate(json!({"A": null, "B": [], "C": {}}), &ABC, "").unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::Missing { field: "A".into() }]
        );
    }

    #[test]
    fn scalar_and_object_rejected_as_array() {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("x", FieldShape::Array),
            FieldSpec::new("y", FieldShape::Array),
        ];
        let schema = SchemaDescriptor::new("arrays", FIELDS);
        let err = validate(json!({"x": "a,b", "y": {"0": "a"}}), &schema, "").unwrap_err();
        assert_eq!(
            err.violations(),
            &[
                Violation::WrongShape {
                    field: "x".into(),
                    expected: "array".into(),
                    found: "string".into(),
                },
                Violation::WrongShape {
                    field: "y".into(),
                    expected: "array".into(),
                    found: "object".into(),
                },
            ]
        );
    }

    #[test]
    fn object_array_rejects_scalar_elements() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::new("steps", FieldShape::ObjectArray)];
        let schema = SchemaDescriptor::new("steps", FIELDS);
        let err = validate(json!({"steps": [{}, "oops"]}), &schema, "").unwrap_err();
        match &err.violations()[0] {
            Violation::WrongShape { found, .. } => assert_eq!(found, "string at index 1"),
            other => panic!("unexpected violation: {other:?}"),
        }
    }

    #[test]
    fn non_object_top_level() {
        let err = validate(json!([1, 2]), &ABC, "[1, 2]").unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::NotAnObject {
                found: "array".into()
            }]
        );
        assert_eq!(err.raw_reply(), "[1, 2]");
    }

    const RATED: SchemaDescriptor = SchemaDescriptor::array_of(
        "rated",
        &[
            FieldSpec::new("criteria", FieldShape::Scalar),
            FieldSpec::new("ratings", FieldShape::Object),
        ],
    );

    #[test]
    fn array_root_checks_every_element() {
        let value = json!([
            {"criteria": "Overall", "ratings": {"1": "8/10"}},
            {"criteria": "Depth", "ratings": {"1": "6/10"}, "notes": "thin"}
        ]);
        let ok = validate(value.clone(), &RATED, "").unwrap();
        assert_eq!(ok, value);
    }

    #[test]
    fn array_root_paths_name_the_element() {
        let err = validate(
            json!([{"criteria": "Overall"}, "oops", {"ratings": "8/10"}]),
            &RATED,
            "",
        )
        .unwrap_err();
        let fields: Vec<_> = err.violations().iter().filter_map(Violation::field).collect();
        assert_eq!(fields, vec!["[0].ratings", "[1]", "[2].criteria", "[2].ratings"]);
    }

    #[test]
    fn array_root_rejects_object() {
        let err = validate(json!({"criteria": "x", "ratings": {}}), &RATED, "").unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::NotAnArray {
                found: "object".into()
            }]
        );
    }
}

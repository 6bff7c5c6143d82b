//! Shape validation for JSON records returned by the service.
//!
//! All checks are pure functions over a single `serde_json::Value`; calling
//! them twice on the same record always gives the same answer.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::resource::Resource;

/// Semantic type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    /// An ISO-8601 timestamp carried as a JSON string.
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "text",
            FieldKind::Timestamp => "timestamp string",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` should be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("record does not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fail on the first expected field the record does not carry. A field
/// holding `null` is present.
pub fn validate_structure(record: &Value, expected_fields: &[&str]) -> Result<(), ShapeError> {
    let map = record.as_object().ok_or(ShapeError::NotAnObject {
        found: json_type(record),
    })?;
    for field in expected_fields {
        if !map.contains_key(*field) {
            return Err(ShapeError::MissingField {
                field: (*field).to_string(),
            });
        }
    }
    Ok(())
}

/// Fail on the first field whose JSON type does not match its declared kind.
pub fn validate_types(record: &Value, fields: &[FieldSpec]) -> Result<(), ShapeError> {
    let map = record.as_object().ok_or(ShapeError::NotAnObject {
        found: json_type(record),
    })?;
    for spec in fields {
        let value = map.get(spec.name).ok_or_else(|| ShapeError::MissingField {
            field: spec.name.to_string(),
        })?;
        let matches = match spec.kind {
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Text | FieldKind::Timestamp => value.is_string(),
        };
        if !matches {
            return Err(ShapeError::WrongType {
                field: spec.name.to_string(),
                expected: spec.kind,
                found: json_type(value),
            });
        }
    }
    Ok(())
}

/// Structure check on a response body: for an array, the first element is
/// checked; an empty array passes.
pub fn validate_response_structure(body: &Value, expected_fields: &[&str]) -> Result<(), ShapeError> {
    match body {
        Value::Array(items) => match items.first() {
            Some(first) => validate_structure(first, expected_fields),
            None => Ok(()),
        },
        other => validate_structure(other, expected_fields),
    }
}

/// Check structure and types against `R`'s declared fields, then decode.
pub fn parse_record<R: Resource>(record: &Value) -> Result<R::Record, ShapeError> {
    validate_structure(record, &R::field_names())?;
    validate_types(record, R::FIELDS)?;
    Ok(serde_json::from_value(record.clone())?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

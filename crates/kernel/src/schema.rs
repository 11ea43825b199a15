//! Static field manifests for content kinds.
//!
//! A kind is described by a fixed list of `(name, type, required)` tuples.
//! The same manifest drives payload validation for create and patch, so
//! there is no runtime reflection anywhere in the mapping path.

use serde_json::{json, Map, Value};

/// Value shape a field accepts on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string
    Text,
    /// Non-negative JSON integer
    Integer,
    /// JSON boolean
    Boolean,
    /// Array of `{"id": "<uuid>"}` entity references
    References,
}

/// One entry of a kind's field manifest.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// A content kind and its complete field manifest.
#[derive(Debug, Clone, Copy)]
pub struct KindDef {
    pub kind: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Validate a payload map against a field manifest.
///
/// Returns one `{"field", "error"}` entry per violation. Required fields
/// are only enforced when `enforce_required` is set (create, not patch);
/// an explicit `null` counts as absent. Unknown payload keys are ignored,
/// matching the mapper's overwrite semantics.
pub fn check_payload(
    fields: &[FieldSpec],
    payload: &Map<String, Value>,
    enforce_required: bool,
) -> Vec<Value> {
    let mut violations = Vec::new();

    for spec in fields {
        match payload.get(spec.name) {
            None | Some(Value::Null) => {
                if enforce_required && spec.required {
                    violations.push(json!({"field": spec.name, "error": "required"}));
                }
            }
            Some(value) => {
                if let Some(error) = check_value(spec.field_type, value) {
                    violations.push(json!({"field": spec.name, "error": error}));
                }
            }
        }
    }

    violations
}

fn check_value(field_type: FieldType, value: &Value) -> Option<&'static str> {
    match field_type {
        FieldType::Text => (!value.is_string()).then_some("expected a string"),
        FieldType::Integer => value
            .as_u64()
            .is_none()
            .then_some("expected a non-negative integer"),
        FieldType::Boolean => (!value.is_boolean()).then_some("expected a boolean"),
        FieldType::References => {
            let all_refs = value.as_array().is_some_and(|refs| {
                refs.iter()
                    .all(|r| r.get("id").and_then(Value::as_str).is_some())
            });
            (!all_refs).then_some("expected an array of {\"id\"} references")
        }
    }
}

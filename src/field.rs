//! Per-field decode/encode policy.
//!
//! Decode order: missing or `null` falls back (default, then absent
//! optional, then empty compact container), otherwise the node is coerced
//! to the declared type and passed through the transformer. A field with a
//! fallback never fails: coercion and transform failures degrade to the
//! empty container for compact fields and to the same fallback otherwise.
use serde_json::Value;
use tracing::debug;

use crate::coerce::{decode_node, encode_value};
use crate::error::DecodeError;
use crate::shape::FieldSpec;
use crate::value::TypedValue;

pub fn decode_field(node: Option<&Value>, field: &FieldSpec) -> Result<TypedValue, DecodeError> {
    let node = match node {
        None | Some(Value::Null) => {
            return field.fallback().ok_or_else(|| DecodeError::MissingRequiredField {
                field: field.name.clone(),
            });
        }
        Some(node) => node,
    };

    let raw = match decode_node(node, &field.ty) {
        Ok(raw) => raw,
        Err(e) => {
            let e = e.into_decode_error(&field.name);
            return degrade(field, e);
        }
    };

    let Some(t) = &field.transformer else {
        return Ok(raw);
    };
    match t.decode(raw) {
        Ok(v) => Ok(v),
        Err(cause) => degrade(
            field,
            DecodeError::TransformError { field: field.name.clone(), cause: cause.to_string() },
        ),
    }
}

/// Present but unusable: compact fields become the empty container even
/// when optional or defaulted, others take their usual fallback.
fn degrade(field: &FieldSpec, err: DecodeError) -> Result<TypedValue, DecodeError> {
    let fallback = if field.compact {
        field.ty.empty_container()
    } else {
        field.fallback()
    };
    match fallback {
        Some(v) => {
            debug!(field = %field.name, error = %err, "field degraded to fallback");
            Ok(v)
        }
        None => Err(err),
    }
}

/// Encode one field. `None` means the field is left out of the object.
pub fn encode_field(value: &TypedValue, field: &FieldSpec) -> Option<Value> {
    if field.skip {
        return None;
    }
    let raw = match &field.transformer {
        Some(t) if !value.is_none() => t.encode(value),
        _ => value.clone(),
    };
    if raw.is_none() && field.optional {
        return None;
    }
    Some(encode_value(&raw, &field.ty))
}

// ------------------------------- Tests ------------------------------------ //

//! Whole-type decode and encode.
//!
//! Structs decode every field independently and stop at the first fatal
//! field error. Enums select a case, then extract its payload; either
//! failing fails the call. Encoding is total.
use serde_json::{Map, Value};

use crate::coerce::{CoerceError, encode_plain};
use crate::document::{NodeKind, merge_object};
use crate::error::DecodeError;
use crate::field::{decode_field, encode_field};
use crate::keys;
use crate::matcher::{encode_tag, select_case};
use crate::payload::{encode_payload, extract_payload};
use crate::shape::{EnumSpec, StructSpec, TypeSpec};
use crate::value::{Record, TypedValue, Variant};

pub fn decode(document: &Value, spec: &TypeSpec) -> Result<TypedValue, DecodeError> {
    match spec {
        TypeSpec::Struct(s) => decode_struct(document, s).map(TypedValue::Record),
        TypeSpec::Enum(e) => decode_enum(document, e).map(TypedValue::Variant),
    }
}

pub fn encode(value: &TypedValue, spec: &TypeSpec) -> Value {
    match (value, spec) {
        (TypedValue::Record(r), TypeSpec::Struct(s)) => Value::Object(encode_struct(r, s)),
        (TypedValue::Variant(v), TypeSpec::Enum(e)) => encode_enum(v, e),
        _ => encode_plain(value),
    }
}

fn decode_struct(document: &Value, spec: &StructSpec) -> Result<Record, DecodeError> {
    if !document.is_object() {
        let mismatch =
            CoerceError::Mismatch { expected: "object".into(), actual: NodeKind::of(document) };
        return Err(mismatch.into_decode_error(&spec.name));
    }
    let mut record = Record::new();
    for field in &spec.fields {
        let value = if field.skip {
            field.fallback().ok_or_else(|| DecodeError::MissingRequiredField {
                field: field.name.clone(),
            })?
        } else if let Some(nested) = field.flattened_shape() {
            decode(document, nested)?
        } else {
            decode_field(keys::resolve(document, field), field)?
        };
        record.fields.insert(field.name.clone(), value);
    }
    Ok(record)
}

fn decode_enum(document: &Value, spec: &EnumSpec) -> Result<Variant, DecodeError> {
    let (case, location) = select_case(document, spec)?;
    let values = extract_payload(location, case)?;
    Ok(Variant { case: case.name.clone(), values })
}

fn encode_struct(record: &Record, spec: &StructSpec) -> Map<String, Value> {
    let mut out = Map::new();
    for field in &spec.fields {
        let value = record.get(&field.name).unwrap_or(&TypedValue::None);
        if let Some(nested) = field.flattened_shape() {
            if let Value::Object(inner) = encode(value, nested) {
                merge_object(&mut out, inner);
            }
            continue;
        }
        if let Some(node) = encode_field(value, field) {
            keys::write(&mut out, field, node);
        }
    }
    out
}

fn encode_enum(variant: &Variant, spec: &EnumSpec) -> Value {
    match spec.case(&variant.case) {
        Some(case) => encode_tag(case, spec, encode_payload(variant, case)),
        None => encode_plain(&TypedValue::Variant(variant.clone())),
    }
}

// ------------------------------- Tests ------------------------------------ //

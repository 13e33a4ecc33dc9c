//! Lenient node ⇄ value conversion guided by a declared [`Ty`].
//!
//! Decoding widens where it is lossless: integers decode as numbers,
//! integral floats decode as integers, numeric strings decode as numbers,
//! numbers decode as strings. Everything else is a mismatch.
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::codec;
use crate::document::NodeKind;
use crate::error::DecodeError;
use crate::ir::Ty;
use crate::value::{Record, TypedValue, Variant};

#[derive(Debug)]
pub(crate) enum CoerceError {
    Mismatch { expected: String, actual: NodeKind },
    /// A nested shape failed on its own terms.
    Nested(DecodeError),
}

impl CoerceError {
    fn mismatch(ty: &Ty, node: &Value) -> Self {
        CoerceError::Mismatch { expected: ty.to_string(), actual: NodeKind::of(node) }
    }

    pub(crate) fn into_decode_error(self, field: &str) -> DecodeError {
        match self {
            CoerceError::Mismatch { expected, actual } => {
                DecodeError::TypeMismatch { field: field.to_string(), expected, actual }
            }
            CoerceError::Nested(e) => e,
        }
    }
}

pub(crate) fn decode_node(node: &Value, ty: &Ty) -> Result<TypedValue, CoerceError> {
    let mismatch = || CoerceError::mismatch(ty, node);
    match ty {
        Ty::Any => Ok(TypedValue::Raw(node.clone())),
        Ty::Nullable(inner) => match node {
            Value::Null => Ok(TypedValue::None),
            _ => decode_node(node, inner),
        },
        Ty::Bool => lenient_bool(node).map(TypedValue::Bool).ok_or_else(mismatch),
        Ty::Integer => lenient_i64(node).map(TypedValue::Int).ok_or_else(mismatch),
        Ty::Number => lenient_f64(node).map(TypedValue::Float).ok_or_else(mismatch),
        Ty::String => match node {
            Value::String(s) => Ok(TypedValue::String(s.clone())),
            Value::Number(n) => Ok(TypedValue::String(n.to_string())),
            _ => Err(mismatch()),
        },
        Ty::List(item) => {
            let xs = node.as_array().ok_or_else(mismatch)?;
            xs.iter()
                .map(|x| decode_node(x, item))
                .collect::<Result<Vec<_>, _>>()
                .map(TypedValue::List)
        }
        Ty::Set(item) => {
            let xs = node.as_array().ok_or_else(mismatch)?;
            let mut out: Vec<TypedValue> = Vec::with_capacity(xs.len());
            for x in xs {
                let v = decode_node(x, item)?;
                if !out.contains(&v) {
                    out.push(v);
                }
            }
            Ok(TypedValue::Set(out))
        }
        Ty::Map(item) => {
            let obj = node.as_object().ok_or_else(mismatch)?;
            let mut out = IndexMap::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), decode_node(v, item)?);
            }
            Ok(TypedValue::Map(out))
        }
        Ty::Shape(spec) => codec::decode(node, spec).map_err(CoerceError::Nested),
    }
}

pub(crate) fn lenient_bool(node: &Value) -> Option<bool> {
    match node {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Bool node only, or its textual form. Used by tag matching, where `1`
/// must stay an integer discriminant.
pub(crate) fn strict_bool(node: &Value) -> Option<bool> {
    match node {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn lenient_i64(node: &Value) -> Option<i64> {
    match node {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

pub(crate) fn lenient_f64(node: &Value) -> Option<f64> {
    match node {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

// ------------------------------- Encode ----------------------------------- //

/// Total: values that do not fit `ty` are written by their own shape.
pub(crate) fn encode_value(value: &TypedValue, ty: &Ty) -> Value {
    match (value, ty) {
        (TypedValue::None, _) => Value::Null,
        (_, Ty::Nullable(inner)) => encode_value(value, inner),
        (TypedValue::Record(_) | TypedValue::Variant(_), Ty::Shape(spec)) => {
            codec::encode(value, spec)
        }
        (TypedValue::Int(i), Ty::Number) => float(*i as f64),
        (TypedValue::Float(f), Ty::Integer) => {
            integral(*f).map(Value::from).unwrap_or_else(|| float(*f))
        }
        (TypedValue::Int(i), Ty::String) => Value::String(i.to_string()),
        (TypedValue::List(xs) | TypedValue::Set(xs), Ty::List(item) | Ty::Set(item)) => {
            Value::Array(xs.iter().map(|x| encode_value(x, item)).collect())
        }
        (TypedValue::Map(m), Ty::Map(item)) => {
            Value::Object(m.iter().map(|(k, v)| (k.clone(), encode_value(v, item))).collect())
        }
        _ => encode_plain(value),
    }
}

/// Encode without type guidance.
pub(crate) fn encode_plain(value: &TypedValue) -> Value {
    match value {
        TypedValue::None => Value::Null,
        TypedValue::Bool(b) => Value::Bool(*b),
        TypedValue::Int(i) => Value::from(*i),
        TypedValue::Float(f) => float(*f),
        TypedValue::String(s) => Value::String(s.clone()),
        TypedValue::Bytes(b) => Value::Array(b.iter().map(|x| Value::from(*x)).collect()),
        TypedValue::Timestamp(t) => Value::String(t.to_rfc3339()),
        TypedValue::List(xs) | TypedValue::Set(xs) => {
            Value::Array(xs.iter().map(encode_plain).collect())
        }
        TypedValue::Map(m) => {
            Value::Object(m.iter().map(|(k, v)| (k.clone(), encode_plain(v))).collect())
        }
        TypedValue::Record(Record { fields }) => {
            Value::Object(fields.iter().map(|(k, v)| (k.clone(), encode_plain(v))).collect())
        }
        TypedValue::Variant(Variant { case, values }) => {
            let mut payload = Map::new();
            for (i, (label, v)) in values.iter().enumerate() {
                let key = label.clone().unwrap_or_else(|| format!("_{i}"));
                payload.insert(key, encode_plain(v));
            }
            let mut out = Map::new();
            out.insert(case.clone(), Value::Object(payload));
            Value::Object(out)
        }
        TypedValue::Raw(v) => v.clone(),
    }
}

// NaN and infinities have no JSON form
fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

// ------------------------------- Tests ------------------------------------ //

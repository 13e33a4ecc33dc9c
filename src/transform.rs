//! Bidirectional value converters attached to fields.
//!
//! On decode the field's declared type is decoded first and the result is
//! handed to [`Transformer::decode`]. On encode [`Transformer::encode`] runs
//! first and its output is written with the declared type.
use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::value::TypedValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub trait Transformer: Send + Sync + fmt::Debug {
    fn decode(&self, raw: TypedValue) -> Result<TypedValue, TransformError>;

    /// Must be total.
    fn encode(&self, value: &TypedValue) -> TypedValue;
}

/// Base64 text ⇄ bytes. Declare the field as `Ty::String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64;

impl Transformer for Base64 {
    fn decode(&self, raw: TypedValue) -> Result<TypedValue, TransformError> {
        match raw {
            TypedValue::String(s) => BASE64
                .decode(s.as_bytes())
                .map(TypedValue::Bytes)
                .map_err(|e| TransformError::new(format!("invalid base64: {e}"))),
            other => Err(TransformError::new(format!("expected base64 string, got {other:?}"))),
        }
    }

    fn encode(&self, value: &TypedValue) -> TypedValue {
        match value {
            TypedValue::Bytes(b) => TypedValue::String(BASE64.encode(b)),
            other => other.clone(),
        }
    }
}

/// Wire representation of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCoding {
    /// Fractional seconds since the Unix epoch. Declare as `Ty::Number`.
    SecondsSince1970,
    /// Integer milliseconds since the Unix epoch. Declare as `Ty::Integer`.
    MillisecondsSince1970,
    /// RFC 3339 text. Declare as `Ty::String`.
    Rfc3339,
}

impl DateCoding {
    fn from_seconds(secs: f64) -> Option<DateTime<Utc>> {
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round() as u32;
        Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
    }
}

impl Transformer for DateCoding {
    fn decode(&self, raw: TypedValue) -> Result<TypedValue, TransformError> {
        let parsed = match (self, &raw) {
            (DateCoding::SecondsSince1970, _) => raw.as_f64().and_then(Self::from_seconds),
            (DateCoding::MillisecondsSince1970, TypedValue::Int(ms)) => {
                Utc.timestamp_millis_opt(*ms).single()
            }
            (DateCoding::MillisecondsSince1970, TypedValue::Float(ms)) => {
                Self::from_seconds(ms / 1000.0)
            }
            (DateCoding::Rfc3339, TypedValue::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok(),
            _ => None,
        };
        parsed
            .map(TypedValue::Timestamp)
            .ok_or_else(|| TransformError::new(format!("invalid {self:?} timestamp: {raw:?}")))
    }

    fn encode(&self, value: &TypedValue) -> TypedValue {
        let TypedValue::Timestamp(t) = value else {
            return value.clone();
        };
        match self {
            DateCoding::SecondsSince1970 => {
                let secs = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9;
                TypedValue::Float(secs)
            }
            DateCoding::MillisecondsSince1970 => TypedValue::Int(t.timestamp_millis()),
            DateCoding::Rfc3339 => TypedValue::String(t.to_rfc3339()),
        }
    }
}

type DecodeFn = dyn Fn(TypedValue) -> Result<TypedValue, TransformError> + Send + Sync;
type EncodeFn = dyn Fn(&TypedValue) -> TypedValue + Send + Sync;

/// Transformer assembled from a pair of closures.
pub struct FnTransformer {
    name: &'static str,
    decode: Box<DecodeFn>,
    encode: Box<EncodeFn>,
}

impl FnTransformer {
    pub fn new<D, E>(name: &'static str, decode: D, encode: E) -> Self
    where
        D: Fn(TypedValue) -> Result<TypedValue, TransformError> + Send + Sync + 'static,
        E: Fn(&TypedValue) -> TypedValue + Send + Sync + 'static,
    {
        Self { name, decode: Box::new(decode), encode: Box::new(encode) }
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnTransformer").field(&self.name).finish()
    }
}

impl Transformer for FnTransformer {
    fn decode(&self, raw: TypedValue) -> Result<TypedValue, TransformError> {
        (self.decode)(raw)
    }

    fn encode(&self, value: &TypedValue) -> TypedValue {
        (self.encode)(value)
    }
}

// ------------------------------- Tests ------------------------------------ //

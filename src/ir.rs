// Declared value types for fields and payload slots. No serde_json::Value here.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::shape::TypeSpec;
use crate::value::TypedValue;

#[derive(Debug, Clone)]
pub enum Ty {
    Any,                     // raw document node, kept as-is
    Bool,
    Integer,
    Number,
    String,
    List(Box<Ty>),
    Set(Box<Ty>),            // deduplicated, first occurrence wins
    Map(Box<Ty>),            // string-keyed
    Nullable(Box<Ty>),       // optional wrapper
    Shape(Arc<TypeSpec>),    // nested struct or enum
}

impl Ty {
    pub fn list(item: Ty) -> Self {
        Ty::List(Box::new(item))
    }
    pub fn set(item: Ty) -> Self {
        Ty::Set(Box::new(item))
    }
    pub fn map(item: Ty) -> Self {
        Ty::Map(Box::new(item))
    }
    pub fn nullable(inner: Ty) -> Self {
        Ty::Nullable(Box::new(inner))
    }
    pub fn shape(spec: impl Into<Arc<TypeSpec>>) -> Self {
        Ty::Shape(spec.into())
    }

    /// Sequence, set, or mapping, possibly behind `Nullable`.
    pub fn is_container(&self) -> bool {
        match self {
            Ty::Nullable(inner) => inner.is_container(),
            _ => matches!(self, Ty::List(_) | Ty::Set(_) | Ty::Map(_)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Ty::Nullable(_))
    }

    /// Canonical empty value for container types.
    pub fn empty_container(&self) -> Option<TypedValue> {
        match self {
            Ty::Nullable(inner) => inner.empty_container(),
            Ty::List(_) => Some(TypedValue::List(Vec::new())),
            Ty::Set(_) => Some(TypedValue::Set(Vec::new())),
            Ty::Map(_) => Some(TypedValue::Map(IndexMap::new())),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => f.write_str("any"),
            Ty::Bool => f.write_str("bool"),
            Ty::Integer => f.write_str("integer"),
            Ty::Number => f.write_str("number"),
            Ty::String => f.write_str("string"),
            Ty::List(t) => write!(f, "list<{t}>"),
            Ty::Set(t) => write!(f, "set<{t}>"),
            Ty::Map(t) => write!(f, "map<{t}>"),
            Ty::Nullable(t) => write!(f, "{t}?"),
            Ty::Shape(s) => f.write_str(s.name()),
        }
    }
}

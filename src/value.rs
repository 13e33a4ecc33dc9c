//! In-memory typed values produced by decoding and consumed by encoding.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Absent optional.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    List(Vec<TypedValue>),
    Set(Vec<TypedValue>),
    Map(IndexMap<String, TypedValue>),
    Record(Record),
    Variant(Variant),
    Raw(Value),
}

/// Decoded struct: field name → value, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: IndexMap<String, TypedValue>,
}

/// Decoded enum case with its payload in positional order.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub case: String,
    pub values: Vec<(Option<String>, TypedValue)>,
}

impl TypedValue {
    pub fn is_none(&self) -> bool {
        matches!(self, TypedValue::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            TypedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            TypedValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            TypedValue::Variant(v) => Some(v),
            _ => None,
        }
    }

    /// Unit case of an enum.
    pub fn case(name: impl Into<String>) -> Self {
        TypedValue::Variant(Variant::unit(name))
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}
impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Int(i)
    }
}
impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float(f)
    }
}
impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}
impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}
impl From<Record> for TypedValue {
    fn from(r: Record) -> Self {
        TypedValue::Record(r)
    }
}
impl From<Variant> for TypedValue {
    fn from(v: Variant) -> Self {
        TypedValue::Variant(v)
    }
}
impl<T: Into<TypedValue>> From<Vec<T>> for TypedValue {
    fn from(xs: Vec<T>) -> Self {
        TypedValue::List(xs.into_iter().map(Into::into).collect())
    }
}
impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(x: Option<T>) -> Self {
        x.map_or(TypedValue::None, Into::into)
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<TypedValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.get(name)
    }
}

impl Variant {
    pub fn unit(case: impl Into<String>) -> Self {
        Self { case: case.into(), values: Vec::new() }
    }

    pub fn with(mut self, label: Option<&str>, value: impl Into<TypedValue>) -> Self {
        self.values.push((label.map(str::to_string), value.into()));
        self
    }

    /// Payload value bound to `label`.
    pub fn field(&self, label: &str) -> Option<&TypedValue> {
        self.values.iter().find(|(l, _)| l.as_deref() == Some(label)).map(|(_, v)| v)
    }

    /// Payload value at position `index`.
    pub fn at(&self, index: usize) -> Option<&TypedValue> {
        self.values.get(index).map(|(_, v)| v)
    }
}

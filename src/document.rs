//! Generic document tree.
//!
//! Documents are plain `serde_json::Value`s (built with `preserve_order`, so
//! object keys keep their insertion order). This module adds the handful of
//! operations the codec needs on top: node classification, dotted-path
//! navigation, and path insertion for encoding.
use std::fmt;

use serde_json::{Map, Value};

/// A parsed document node.
pub type Document = Value;

/// Kind of a document node, as named in type-mismatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl NodeKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            // u64 values past i64::MAX do not fit the integer model
            Value::Number(n) if n.is_i64() => NodeKind::Int,
            Value::Number(_) => NodeKind::Float,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Int => "integer",
            NodeKind::Float => "number",
            NodeKind::String => "string",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        };
        f.write_str(s)
    }
}

pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// Walk `path` object-key by object-key.
///
/// Returns `None` when a segment is absent or a non-object sits mid-path.
/// A present `null` terminal is returned as `Some(Value::Null)`.
pub fn navigate<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = node;
    for seg in split_path(path) {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

/// Write `value` at `path` inside `target`, creating intermediate objects.
///
/// An intermediate that exists but is not an object is replaced.
pub fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segs: Vec<&str> = split_path(path).collect();
    let Some(last) = segs.pop() else { return };
    let mut cur = target;
    for seg in segs {
        let slot = cur.entry(seg.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            unreachable!("slot was just made an object");
        };
        cur = next;
    }
    cur.insert(last.to_string(), value);
}

/// Merge the entries of `from` into `into`; later keys overwrite.
pub fn merge_object(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (k, v) in from {
        into.insert(k, v);
    }
}

/// Textual form of a scalar, used to compare against path-tag literals.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //

use std::fmt;
use std::ops::{Bound, RangeBounds};

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::ConfigError;
use crate::ir::Ty;
use crate::shape::field::FieldSpec;
use crate::value::TypedValue;

/// Predicate selecting an enum case from a document discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseMatcher {
    Bool(bool),
    Int(i64),
    IntRange(Bound<i64>, Bound<i64>),
    Double(OrderedFloat<f64>),
    DoubleRange(Bound<OrderedFloat<f64>>, Bound<OrderedFloat<f64>>),
    String(String),
    StringRange(Bound<String>, Bound<String>),
    /// `"a.b.tag"`: navigate `a.b`, expect the scalar `tag`.
    PathValue(String),
}

impl CaseMatcher {
    pub fn string(s: impl Into<String>) -> Self {
        CaseMatcher::String(s.into())
    }

    pub fn double(d: f64) -> Self {
        CaseMatcher::Double(OrderedFloat(d))
    }

    pub fn path(p: impl Into<String>) -> Self {
        CaseMatcher::PathValue(p.into())
    }

    pub fn int_range(r: impl RangeBounds<i64>) -> Self {
        CaseMatcher::IntRange(r.start_bound().cloned(), r.end_bound().cloned())
    }

    pub fn double_range(r: impl RangeBounds<f64>) -> Self {
        CaseMatcher::DoubleRange(
            r.start_bound().cloned().map(OrderedFloat),
            r.end_bound().cloned().map(OrderedFloat),
        )
    }

    pub fn string_range<S: AsRef<str>>(r: impl RangeBounds<S>) -> Self {
        CaseMatcher::StringRange(
            r.start_bound().map(|s| s.as_ref().to_string()),
            r.end_bound().map(|s| s.as_ref().to_string()),
        )
    }

    pub fn is_path(&self) -> bool {
        matches!(self, CaseMatcher::PathValue(_))
    }

    /// Value written when encoding a case whose first matcher is `self`.
    /// For ranges this is the smallest member; `None` if the range is empty.
    pub(crate) fn canonical(&self) -> Option<Value> {
        match self {
            CaseMatcher::Bool(b) => Some(Value::Bool(*b)),
            CaseMatcher::Int(i) => Some(Value::from(*i)),
            CaseMatcher::Double(d) => serde_json::Number::from_f64(d.0).map(Value::Number),
            CaseMatcher::String(s) => Some(Value::String(s.clone())),
            CaseMatcher::IntRange(lo, hi) => {
                let x = match (lo, hi) {
                    (Bound::Included(lo), _) => Some(*lo),
                    (Bound::Excluded(lo), _) => lo.checked_add(1),
                    (Bound::Unbounded, Bound::Included(hi)) => Some(*hi),
                    (Bound::Unbounded, Bound::Excluded(hi)) => hi.checked_sub(1),
                    (Bound::Unbounded, Bound::Unbounded) => Some(0),
                }?;
                in_bounds(&x, lo.as_ref(), hi.as_ref()).then(|| Value::from(x))
            }
            CaseMatcher::DoubleRange(lo, hi) => {
                let x = match (lo, hi) {
                    (Bound::Included(lo), _) => *lo,
                    (_, Bound::Included(hi)) => *hi,
                    (Bound::Excluded(lo), Bound::Excluded(hi)) => OrderedFloat((lo.0 + hi.0) / 2.0),
                    (Bound::Excluded(lo), Bound::Unbounded) => OrderedFloat(lo.0 + 1.0),
                    (Bound::Unbounded, Bound::Excluded(hi)) => OrderedFloat(hi.0 - 1.0),
                    (Bound::Unbounded, Bound::Unbounded) => OrderedFloat(0.0),
                };
                if !in_bounds(&x, lo.as_ref(), hi.as_ref()) {
                    return None;
                }
                serde_json::Number::from_f64(x.0).map(Value::Number)
            }
            CaseMatcher::StringRange(lo, hi) => {
                let x = match (lo, hi) {
                    (Bound::Included(lo), _) => lo.clone(),
                    (Bound::Excluded(lo), _) => format!("{lo}\u{0}"),
                    (Bound::Unbounded, _) => String::new(),
                };
                in_bounds(x.as_str(), str_bound(lo), str_bound(hi)).then(|| Value::String(x))
            }
            // path tags are written by the encoder, not as a bare value
            CaseMatcher::PathValue(_) => None,
        }
    }
}

impl fmt::Display for CaseMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound<T: fmt::Display>(b: &Bound<T>, open: &str, closed: &str) -> String {
            match b {
                Bound::Included(x) => format!("{closed}{x}"),
                Bound::Excluded(x) => format!("{open}{x}"),
                Bound::Unbounded => String::new(),
            }
        }
        match self {
            CaseMatcher::Bool(b) => write!(f, "bool {b}"),
            CaseMatcher::Int(i) => write!(f, "int {i}"),
            CaseMatcher::Double(d) => write!(f, "double {d}"),
            CaseMatcher::String(s) => write!(f, "string {s:?}"),
            CaseMatcher::PathValue(p) => write!(f, "path {p:?}"),
            CaseMatcher::IntRange(lo, hi) => {
                write!(f, "int range {}..{}", bound(lo, ">", ""), bound(hi, "<", "="))
            }
            CaseMatcher::DoubleRange(lo, hi) => {
                write!(f, "double range {}..{}", bound(lo, ">", ""), bound(hi, "<", "="))
            }
            CaseMatcher::StringRange(lo, hi) => {
                write!(f, "string range {}..{}", bound(lo, ">", ""), bound(hi, "<", "="))
            }
        }
    }
}

pub(crate) fn in_bounds<T: PartialOrd + ?Sized>(x: &T, start: Bound<&T>, end: Bound<&T>) -> bool {
    let above = match start {
        Bound::Included(s) => x >= s,
        Bound::Excluded(s) => x > s,
        Bound::Unbounded => true,
    };
    let below = match end {
        Bound::Included(e) => x <= e,
        Bound::Excluded(e) => x < e,
        Bound::Unbounded => true,
    };
    above && below
}

pub(crate) fn str_bound(b: &Bound<String>) -> Bound<&str> {
    b.as_ref().map(String::as_str)
}

/// Where one associated value binds in the reconstructed case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Label(String),
    Index(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Label(l) => write!(f, "`{l}`"),
            Slot::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// Declared associated value of a case (its payload type description).
#[derive(Debug, Clone)]
pub struct Param {
    pub label: Option<String>,
    pub ty: Ty,
    pub default: Option<TypedValue>,
}

impl Param {
    pub fn labeled(label: impl Into<String>, ty: Ty) -> Self {
        Self { label: Some(label.into()), ty, default: None }
    }

    pub fn positional(ty: Ty) -> Self {
        Self { label: None, ty, default: None }
    }

    pub fn with_default(mut self, value: impl Into<TypedValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Key list for one associated value.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub slot: Slot,
    pub keys: Vec<String>,
}

impl ValueSpec {
    pub fn label<I, S>(label: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { slot: Slot::Label(label.into()), keys: keys.into_iter().map(Into::into).collect() }
    }

    pub fn index<I, S>(index: usize, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { slot: Slot::Index(index), keys: keys.into_iter().map(Into::into).collect() }
    }
}

/// One payload position after build.
#[derive(Debug, Clone)]
pub(crate) struct Position {
    pub(crate) slot: Slot,
    pub(crate) label: Option<String>,
    pub(crate) field: FieldSpec,
    /// false: no keys, the declared default is always used
    pub(crate) bound: bool,
}

/// Decode/encode rules for one enum case.
#[derive(Debug, Clone)]
pub struct CaseSpec {
    pub(crate) name: String,
    pub(crate) matchers: Vec<CaseMatcher>,
    pub(crate) positions: Vec<Position>,
}

impl CaseSpec {
    pub fn builder(name: impl Into<String>) -> CaseSpecBuilder {
        CaseSpecBuilder {
            name: name.into(),
            matchers: Vec::new(),
            params: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Payload-less case matched by its own name.
    pub fn unit(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(name).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn matchers(&self) -> &[CaseMatcher] {
        &self.matchers
    }
    pub fn has_payload(&self) -> bool {
        !self.positions.is_empty()
    }

    pub(crate) fn path_matcher(&self) -> Option<&str> {
        match self.matchers.as_slice() {
            [CaseMatcher::PathValue(p)] => Some(p),
            _ => None,
        }
    }
}

pub struct CaseSpecBuilder {
    name: String,
    matchers: Vec<CaseMatcher>,
    params: Vec<Param>,
    values: Vec<ValueSpec>,
}

impl CaseSpecBuilder {
    pub fn matcher(mut self, m: CaseMatcher) -> Self {
        self.matchers.push(m);
        self
    }

    pub fn matchers(mut self, ms: impl IntoIterator<Item = CaseMatcher>) -> Self {
        self.matchers.extend(ms);
        self
    }

    pub fn param(mut self, p: Param) -> Self {
        self.params.push(p);
        self
    }

    pub fn params(mut self, ps: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(ps);
        self
    }

    pub fn value(mut self, v: ValueSpec) -> Self {
        self.values.push(v);
        self
    }

    pub fn values(mut self, vs: impl IntoIterator<Item = ValueSpec>) -> Self {
        self.values.extend(vs);
        self
    }

    pub fn build(self) -> Result<CaseSpec, ConfigError> {
        let name = self.name;
        if name.is_empty() {
            return Err(ConfigError::case("", "case name is empty"));
        }

        let matchers = if self.matchers.is_empty() {
            vec![CaseMatcher::String(name.clone())]
        } else {
            self.matchers
        };
        if matchers.len() > 1 && matchers.iter().any(CaseMatcher::is_path) {
            return Err(ConfigError::AmbiguousConfiguration(format!(
                "case `{name}` combines a path matcher with other matchers"
            )));
        }
        for m in &matchers {
            match m {
                CaseMatcher::PathValue(p) => {
                    let segs: Vec<&str> = p.split('.').collect();
                    if segs.len() < 2 || segs.iter().any(|s| s.is_empty()) {
                        let msg = format!("path matcher `{p}` needs `key.value` form");
                        return Err(ConfigError::case(&name, msg));
                    }
                }
                _ => {
                    if m.canonical().is_none() {
                        return Err(ConfigError::case(&name, format!("{m} matches nothing")));
                    }
                }
            }
        }

        // which explicit key list covers each position
        let mut covered: Vec<Option<Vec<String>>> = vec![None; self.params.len()];
        for v in self.values {
            let idx = match &v.slot {
                Slot::Label(l) => self
                    .params
                    .iter()
                    .position(|p| p.label.as_deref() == Some(l.as_str()))
                    .ok_or_else(|| {
                        ConfigError::case(&name, format!("no associated value labelled `{l}`"))
                    })?,
                Slot::Index(i) if *i < self.params.len() => *i,
                Slot::Index(i) => {
                    let msg = format!("associated value index {i} out of range");
                    return Err(ConfigError::case(&name, msg));
                }
            };
            if v.keys.is_empty() {
                let msg = format!("associated value {} has no keys", v.slot);
                return Err(ConfigError::case(&name, msg));
            }
            if covered[idx].is_some() {
                return Err(ConfigError::AmbiguousConfiguration(format!(
                    "case `{name}`: associated value {idx} is configured twice"
                )));
            }
            covered[idx] = Some(v.keys);
        }

        let mut positions = Vec::with_capacity(self.params.len());
        for (i, (param, keys)) in self.params.into_iter().zip(covered).enumerate() {
            let slot = match &param.label {
                Some(l) => Slot::Label(l.clone()),
                None => Slot::Index(i),
            };
            let (keys, bound) = match (keys, &param.label) {
                (Some(keys), _) => (keys, true),
                (None, Some(label)) => (vec![label.clone()], true),
                // never read: its default, or MissingAssociatedValue on decode
                (None, None) => (Vec::new(), false),
            };
            let label = param.label.clone().unwrap_or_else(|| format!("_{i}"));
            let mut field = FieldSpec::builder(label, param.ty).keys(keys);
            if let Some(d) = param.default {
                field = field.default(d);
            }
            let field = field.build().map_err(|e| ConfigError::case(&name, e.to_string()))?;
            positions.push(Position { slot, label: param.label, field, bound });
        }

        Ok(CaseSpec { name, matchers, positions })
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_matcher_must_stand_alone() {
        let err = CaseSpec::builder("tiktok")
            .matcher(CaseMatcher::path("type.middle.tiktok"))
            .matcher(CaseMatcher::string("tiktok"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousConfiguration(_)));
    }

    #[test]
    fn default_matcher_is_case_name() {
        let c = CaseSpec::unit("youtube").unwrap();
        assert_eq!(c.matchers(), [CaseMatcher::string("youtube")]);
        assert!(!c.has_payload());
    }

    #[test]
    fn range_canonical_values() {
        assert_eq!(CaseMatcher::int_range(10..=20).canonical(), Some(json!(10)));
        assert_eq!(CaseMatcher::int_range(..5).canonical(), Some(json!(4)));
        assert_eq!(CaseMatcher::double_range(1.0..2.0).canonical(), Some(json!(1.0)));
        assert_eq!(CaseMatcher::string_range("b"..="d").canonical(), Some(json!("b")));
        assert_eq!(CaseMatcher::int_range(5..5).canonical(), None);
    }

    #[test]
    fn empty_range_rejected() {
        let err = CaseSpec::builder("never")
            .matcher(CaseMatcher::int_range(3..3))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCase { .. }));
    }

    #[test]
    fn positions_bind_labels_and_indices() {
        let c = CaseSpec::builder("vimeo")
            .params([
                Param::labeled("id", Ty::String),
                Param::labeled("duration", Ty::Number).with_default(33.0),
                Param::positional(Ty::Integer),
            ])
            .values([ValueSpec::label("id", ["ID", "Id"]), ValueSpec::index(2, ["minutes"])])
            .build()
            .unwrap();
        let keys: Vec<&[String]> = c.positions.iter().map(|p| p.field.keys()).collect();
        assert_eq!(keys[0], ["ID", "Id"]);
        assert_eq!(keys[1], ["duration"]);
        assert_eq!(keys[2], ["minutes"]);
        assert_eq!(c.positions[2].slot, Slot::Index(2));
    }

    #[test]
    fn uncovered_positionals_are_unbound() {
        let c = CaseSpec::builder("clip").param(Param::positional(Ty::Integer)).build().unwrap();
        assert!(!c.positions[0].bound);
        let c = CaseSpec::builder("clip")
            .param(Param::positional(Ty::Integer).with_default(1_i64))
            .build()
            .unwrap();
        assert!(!c.positions[0].bound);
        assert_eq!(c.positions[0].field.default_value(), Some(&TypedValue::Int(1)));
    }

    #[test]
    fn slot_configured_twice_is_ambiguous() {
        let err = CaseSpec::builder("vimeo")
            .param(Param::labeled("id", Ty::String))
            .values([ValueSpec::label("id", ["ID"]), ValueSpec::index(0, ["Id"])])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousConfiguration(_)));
    }
}

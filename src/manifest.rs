//! Shape files: named struct/enum descriptions in JSON.
//!
//! ```json
//! {
//!   "root": "Video",
//!   "types": {
//!     "Video": { "enum": { "cases": [
//!       { "name": "youtube", "match": [{"string": "youtube"}] },
//!       { "name": "vimeo",
//!         "params": [{"label": "id", "type": "string"},
//!                    {"label": "duration", "type": "number", "default": 33},
//!                    {"type": "integer"}],
//!         "values": [{"label": "id", "keys": ["ID", "Id"]},
//!                    {"index": 2, "keys": ["minutes"]}] }
//!     ] } }
//!   }
//! }
//! ```
//!
//! Types refer to each other by name; `string`, `integer`, `number`,
//! `bool` and `any` are built in, and `{"list": T}`, `{"set": T}`,
//! `{"map": T}`, `{"optional": T}` compose them. Self-reference is rejected.
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::coerce::decode_node;
use crate::error::ConfigError;
use crate::ir::Ty;
use crate::keys::KeyStyle;
use crate::shape::{
    CaseMatcher, CaseSpec, EnumSpec, FieldSpec, Param, StructSpec, Tagging, TypeSpec, ValueSpec,
};
use crate::transform::{Base64, DateCoding, Transformer};
use crate::value::TypedValue;

// ————————————————————————————————————————————————————————————————————————————
// FILE FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub root: Option<String>,
    pub types: IndexMap<String, TypeDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDef {
    Struct(StructDef),
    Enum(EnumDef),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDef {
    #[serde(default)]
    key_style: Option<KeyStyle>,
    #[serde(default)]
    ignore_key_case: bool,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    encode_key: Option<String>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    compact: bool,
    #[serde(default)]
    ignore_key_case: bool,
    #[serde(default)]
    skip: bool,
    #[serde(default)]
    flatten: bool,
    #[serde(default)]
    transform: Option<TransformDef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformDef {
    Base64,
    DateSeconds,
    DateMillis,
    Rfc3339,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    #[serde(default)]
    tag_key: Option<String>,
    cases: Vec<CaseDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseDef {
    name: String,
    #[serde(default, rename = "match")]
    matchers: Vec<MatcherDef>,
    #[serde(default)]
    params: Vec<ParamDef>,
    #[serde(default)]
    values: Vec<ValueDef>,
}

/// Ranges are closed on both ends.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherDef {
    Bool(bool),
    Int(i64),
    IntRange([i64; 2]),
    Double(f64),
    DoubleRange([f64; 2]),
    String(String),
    StringRange([String; 2]),
    Path(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueDef {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Name(String),
    Compound(Compound),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compound {
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>),
    Optional(Box<TypeRef>),
}

const BUILTIN: [&str; 5] = ["any", "bool", "integer", "number", "string"];

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

/// Built shapes by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: IndexMap<String, Arc<TypeSpec>>,
    root: Option<String>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&Arc<TypeSpec>> {
        self.types.get(name)
    }

    /// The declared root, or the only type when there is just one.
    pub fn root(&self) -> Option<&Arc<TypeSpec>> {
        match &self.root {
            Some(name) => self.types.get(name),
            None if self.types.len() == 1 => self.types.values().next(),
            None => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl Manifest {
    pub fn parse(src: &str) -> Result<Self, ConfigError> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Manifest(format!("{}: {e}", path.display())))?;
        Self::parse(&src)
    }

    pub fn build(&self) -> Result<Registry, ConfigError> {
        for name in self.types.keys() {
            if BUILTIN.contains(&name.as_str()) {
                return Err(ConfigError::Manifest(format!("type name `{name}` is reserved")));
            }
        }
        if let Some(root) = &self.root {
            if !self.types.contains_key(root) {
                return Err(ConfigError::UnknownType(root.clone()));
            }
        }
        let mut b = Builder { manifest: self, built: IndexMap::new(), visiting: HashSet::new() };
        for name in self.types.keys() {
            b.shape(name)?;
        }
        // keep declaration order
        let mut types = IndexMap::new();
        for name in self.types.keys() {
            if let Some(spec) = b.built.get(name) {
                types.insert(name.clone(), spec.clone());
            }
        }
        Ok(Registry { types, root: self.root.clone() })
    }
}

struct Builder<'m> {
    manifest: &'m Manifest,
    built: IndexMap<String, Arc<TypeSpec>>,
    visiting: HashSet<String>,
}

impl Builder<'_> {
    fn shape(&mut self, name: &str) -> Result<Arc<TypeSpec>, ConfigError> {
        if let Some(spec) = self.built.get(name) {
            return Ok(spec.clone());
        }
        let def = self
            .manifest
            .types
            .get(name)
            .ok_or_else(|| ConfigError::UnknownType(name.to_string()))?;
        if !self.visiting.insert(name.to_string()) {
            return Err(ConfigError::CyclicType(name.to_string()));
        }
        let spec = match def {
            TypeDef::Struct(s) => self.struct_spec(name, s)?,
            TypeDef::Enum(e) => self.enum_spec(name, e)?,
        };
        self.visiting.remove(name);
        let spec = Arc::new(spec);
        self.built.insert(name.to_string(), spec.clone());
        Ok(spec)
    }

    fn ty(&mut self, r: &TypeRef) -> Result<Ty, ConfigError> {
        Ok(match r {
            TypeRef::Name(n) => match n.as_str() {
                "any" => Ty::Any,
                "bool" => Ty::Bool,
                "integer" => Ty::Integer,
                "number" => Ty::Number,
                "string" => Ty::String,
                other => Ty::Shape(self.shape(other)?),
            },
            TypeRef::Compound(Compound::List(t)) => Ty::list(self.ty(t)?),
            TypeRef::Compound(Compound::Set(t)) => Ty::set(self.ty(t)?),
            TypeRef::Compound(Compound::Map(t)) => Ty::map(self.ty(t)?),
            TypeRef::Compound(Compound::Optional(t)) => Ty::nullable(self.ty(t)?),
        })
    }

    fn struct_spec(&mut self, name: &str, def: &StructDef) -> Result<TypeSpec, ConfigError> {
        let mut b = StructSpec::builder(name);
        if let Some(style) = def.key_style {
            b = b.key_style(style);
        }
        if def.ignore_key_case {
            b = b.ignore_key_case();
        }
        for f in &def.fields {
            b = b.field(self.field_spec(f)?);
        }
        b.build()
    }

    fn field_spec(&mut self, def: &FieldDef) -> Result<FieldSpec, ConfigError> {
        let ty = self.ty(&def.ty)?;
        let transformer = def.transform.map(transformer);
        let mut b = FieldSpec::builder(&def.name, ty.clone()).keys(def.keys.iter().cloned());
        if let Some(p) = &def.path {
            b = b.path(p);
        }
        if let Some(k) = &def.encode_key {
            b = b.encode_key(k);
        }
        if let Some(d) = &def.default {
            let mut value = default_value(d, &ty, &def.name)?;
            if let Some(t) = &transformer {
                value = t
                    .decode(value)
                    .map_err(|e| ConfigError::field(&def.name, format!("default: {e}")))?;
            }
            b = b.default(value);
        }
        if let Some(t) = transformer {
            b = b.shared_transformer(t);
        }
        if def.compact {
            b = b.compact();
        }
        if def.ignore_key_case {
            b = b.ignore_key_case();
        }
        if def.skip {
            b = b.skip();
        }
        if def.flatten {
            b = b.flatten();
        }
        b.build()
    }

    fn enum_spec(&mut self, name: &str, def: &EnumDef) -> Result<TypeSpec, ConfigError> {
        let mut b = EnumSpec::builder(name);
        if let Some(key) = &def.tag_key {
            b = b.tagging(Tagging::Internal { key: key.clone() });
        }
        for c in &def.cases {
            b = b.case(self.case_spec(c)?);
        }
        b.build()
    }

    fn case_spec(&mut self, def: &CaseDef) -> Result<CaseSpec, ConfigError> {
        let mut b = CaseSpec::builder(&def.name).matchers(def.matchers.iter().map(matcher));
        for p in &def.params {
            let ty = self.ty(&p.ty)?;
            let mut param = match &p.label {
                Some(l) => Param::labeled(l, ty.clone()),
                None => Param::positional(ty.clone()),
            };
            if let Some(d) = &p.default {
                param = param.with_default(default_value(d, &ty, &def.name)?);
            }
            b = b.param(param);
        }
        for v in &def.values {
            let spec = match (&v.label, v.index) {
                (Some(l), None) => ValueSpec::label(l, v.keys.iter().cloned()),
                (None, Some(i)) => ValueSpec::index(i, v.keys.iter().cloned()),
                _ => {
                    let detail = "each value needs exactly one of `label` or `index`";
                    return Err(ConfigError::case(&def.name, detail));
                }
            };
            b = b.value(spec);
        }
        b.build()
    }
}

fn matcher(def: &MatcherDef) -> CaseMatcher {
    match def {
        MatcherDef::Bool(b) => CaseMatcher::Bool(*b),
        MatcherDef::Int(i) => CaseMatcher::Int(*i),
        MatcherDef::IntRange([lo, hi]) => CaseMatcher::int_range(*lo..=*hi),
        MatcherDef::Double(d) => CaseMatcher::double(*d),
        MatcherDef::DoubleRange([lo, hi]) => CaseMatcher::double_range(*lo..=*hi),
        MatcherDef::String(s) => CaseMatcher::string(s),
        MatcherDef::StringRange([lo, hi]) => CaseMatcher::string_range(lo.as_str()..=hi.as_str()),
        MatcherDef::Path(p) => CaseMatcher::path(p),
    }
}

fn transformer(def: TransformDef) -> Arc<dyn Transformer> {
    match def {
        TransformDef::Base64 => Arc::new(Base64),
        TransformDef::DateSeconds => Arc::new(DateCoding::SecondsSince1970),
        TransformDef::DateMillis => Arc::new(DateCoding::MillisecondsSince1970),
        TransformDef::Rfc3339 => Arc::new(DateCoding::Rfc3339),
    }
}

fn default_value(node: &Value, ty: &Ty, owner: &str) -> Result<TypedValue, ConfigError> {
    decode_node(node, ty)
        .map_err(|e| ConfigError::field(owner, format!("default: {}", e.into_decode_error(owner))))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const VIDEO: &str = r#"{
        "root": "Video",
        "types": {
            "Video": { "enum": { "cases": [
                { "name": "youtube", "match": [{"string": "youtube"}, {"string": "YOUTUBE"}] },
                { "name": "vimeo",
                  "params": [{"label": "id", "type": "string"},
                             {"label": "duration", "type": "number", "default": 33},
                             {"type": "integer"}],
                  "values": [{"label": "id", "keys": ["ID", "Id"]},
                             {"index": 2, "keys": ["minutes"]}] },
                { "name": "tiktok", "match": [{"path": "type.middle.tiktok"}],
                  "params": [{"label": "url", "type": "string"},
                             {"label": "vid", "type": "string"}] }
            ] } }
        }
    }"#;

    #[test]
    fn builds_and_decodes() {
        let reg = Manifest::parse(VIDEO).unwrap().build().unwrap();
        let video = reg.root().unwrap();
        let doc = json!({"vimeo": {"ID": "234961067", "minutes": 999999}});
        let v = crate::decode(&doc, video).unwrap();
        let v = v.as_variant().unwrap();
        assert_eq!(v.field("duration"), Some(&TypedValue::Float(33.0)));
        assert_eq!(v.at(2), Some(&TypedValue::Int(999999)));
    }

    #[test]
    fn nested_types_by_name() {
        let src = r#"{"types": {
            "Point": {"struct": {"fields": [{"name": "x", "type": "number"}]}},
            "Path": {"struct": {"key_style": "snake_case", "fields": [
                {"name": "points", "type": {"list": "Point"}, "compact": true},
                {"name": "createdAt", "type": "string", "transform": "rfc3339",
                 "default": "2020-01-01T00:00:00Z"},
                {"name": "label", "type": {"optional": "string"}}
            ]}}
        }}"#;
        let reg = Manifest::parse(src).unwrap().build().unwrap();
        assert!(reg.root().is_none());
        assert_eq!(reg.names().collect::<Vec<_>>(), ["Point", "Path"]);
        let path = reg.get("Path").unwrap();
        let doc = json!({"points": [{"x": 1}], "created_at": "2021-05-01T10:00:00Z"});
        let v = crate::decode(&doc, path).unwrap();
        let r = v.as_record().unwrap();
        assert!(matches!(r.get("createdAt"), Some(TypedValue::Timestamp(_))));
        assert_eq!(r.get("label"), Some(&TypedValue::None));
    }

    #[test]
    fn rejects_cycles_and_unknown_names() {
        let cyclic = r#"{"types": {"Node": {"struct": {"fields": [
            {"name": "next", "type": {"optional": "Node"}}
        ]}}}}"#;
        let built = Manifest::parse(cyclic).unwrap().build();
        assert!(matches!(built, Err(ConfigError::CyclicType(_))));

        let unknown = r#"{"types": {"A": {"struct": {"fields": [{"name": "b", "type": "B"}]}}}}"#;
        let built = Manifest::parse(unknown).unwrap().build();
        assert!(matches!(built, Err(ConfigError::UnknownType(ref n)) if n == "B"));

        let reserved = r#"{"types": {"string": {"struct": {"fields": []}}}}"#;
        let built = Manifest::parse(reserved).unwrap().build();
        assert!(matches!(built, Err(ConfigError::Manifest(_))));
    }

    #[test]
    fn parse_errors_carry_a_path() {
        let bad = r#"{"types": {"A": {"struct": {"fields": [
            {"name": "b", "type": "string", "compact": "yes"}
        ]}}}}"#;
        let err = Manifest::parse(bad).unwrap_err();
        assert!(err.to_string().contains("compact"), "{err}");
    }

    #[test]
    fn validation_errors_surface_at_build() {
        let src = r#"{"types": {"E": {"enum": {"cases": [
            {"name": "a", "match": [{"path": "t.a"}, {"string": "a"}]}
        ]}}}}"#;
        assert!(matches!(
            Manifest::parse(src).unwrap().build(),
            Err(ConfigError::AmbiguousConfiguration(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VIDEO.as_bytes()).unwrap();
        let reg = Manifest::load(file.path()).unwrap().build().unwrap();
        assert_eq!(reg.root().unwrap().name(), "Video");
        assert!(Manifest::load(Path::new("/definitely/not/here.json")).is_err());
    }
}

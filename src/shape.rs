//! Immutable type descriptions driving the codec.
//!
//! A [`TypeSpec`] is built once per type through a validating builder (or
//! loaded from a shape file) and then shared read-only by any number of
//! concurrent decode/encode calls. Configuration mistakes surface here, at
//! build time, never during decoding.
pub mod case;
pub mod field;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use case::{CaseMatcher, CaseSpec, CaseSpecBuilder, Param, Slot, ValueSpec};
pub use field::{FieldSpec, FieldSpecBuilder};

use crate::error::ConfigError;
use crate::keys::KeyStyle;
use crate::matcher::scalar_matches;

#[derive(Debug, Clone)]
pub enum TypeSpec {
    Struct(StructSpec),
    Enum(EnumSpec),
}

impl TypeSpec {
    pub fn name(&self) -> &str {
        match self {
            TypeSpec::Struct(s) => &s.name,
            TypeSpec::Enum(e) => &e.name,
        }
    }

    pub fn into_shared(self) -> Arc<TypeSpec> {
        Arc::new(self)
    }
}

#[derive(Debug, Clone)]
pub struct StructSpec {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldSpec>,
}

impl StructSpec {
    pub fn builder(name: impl Into<String>) -> StructSpecBuilder {
        StructSpecBuilder {
            name: name.into(),
            fields: Vec::new(),
            key_style: None,
            ignore_key_case: false,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

pub struct StructSpecBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    key_style: Option<KeyStyle>,
    ignore_key_case: bool,
}

impl StructSpecBuilder {
    pub fn field(mut self, f: FieldSpec) -> Self {
        self.fields.push(f);
        self
    }

    pub fn fields(mut self, fs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fs);
        self
    }

    pub fn key_style(mut self, style: KeyStyle) -> Self {
        self.key_style = Some(style);
        self
    }

    /// Every field ignores key case.
    pub fn ignore_key_case(mut self) -> Self {
        self.ignore_key_case = true;
        self
    }

    pub fn build(self) -> Result<TypeSpec, ConfigError> {
        let mut fields = self.fields;
        let mut names = HashSet::new();
        for f in &mut fields {
            if !names.insert(f.name.clone()) {
                return Err(ConfigError::AmbiguousConfiguration(format!(
                    "struct `{}` declares field `{}` twice",
                    self.name, f.name
                )));
            }
            if let Some(style) = self.key_style {
                f.apply_key_style(style);
            }
            if self.ignore_key_case {
                f.set_ignore_key_case();
            }
        }
        Ok(TypeSpec::Struct(StructSpec { name: self.name, fields }))
    }
}

/// How an enum with associated values is laid out in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tagging {
    /// `{"<tag>": {payload}}`; for enums without payloads, the bare tag.
    #[default]
    External,
    /// `{"<key>": "<tag>", ...payload}`.
    Internal { key: String },
}

#[derive(Debug, Clone)]
pub struct EnumSpec {
    pub(crate) name: String,
    pub(crate) cases: Vec<CaseSpec>,
    /// Any case carries associated values.
    pub(crate) has_payload: bool,
    pub(crate) tagging: Tagging,
}

impl EnumSpec {
    pub fn builder(name: impl Into<String>) -> EnumSpecBuilder {
        EnumSpecBuilder { name: name.into(), cases: Vec::new(), tagging: Tagging::External }
    }

    pub fn cases(&self) -> &[CaseSpec] {
        &self.cases
    }
    pub fn has_payload(&self) -> bool {
        self.has_payload
    }
    pub fn tagging(&self) -> &Tagging {
        &self.tagging
    }

    pub(crate) fn case(&self, name: &str) -> Option<&CaseSpec> {
        self.cases.iter().find(|c| c.name == name)
    }
}

pub struct EnumSpecBuilder {
    name: String,
    cases: Vec<CaseSpec>,
    tagging: Tagging,
}

impl EnumSpecBuilder {
    pub fn case(mut self, c: CaseSpec) -> Self {
        self.cases.push(c);
        self
    }

    pub fn cases(mut self, cs: impl IntoIterator<Item = CaseSpec>) -> Self {
        self.cases.extend(cs);
        self
    }

    pub fn tagging(mut self, tagging: Tagging) -> Self {
        self.tagging = tagging;
        self
    }

    pub fn build(self) -> Result<TypeSpec, ConfigError> {
        self.build_enum().map(TypeSpec::Enum)
    }

    pub fn build_enum(self) -> Result<EnumSpec, ConfigError> {
        let name = self.name;
        if self.cases.is_empty() {
            return Err(ConfigError::case(&name, "enum has no cases"));
        }
        if matches!(&self.tagging, Tagging::Internal { key } if key.is_empty()) {
            return Err(ConfigError::case(&name, "empty tag key"));
        }

        let has_payload = self.cases.iter().any(CaseSpec::has_payload);
        let mut case_names = HashSet::new();
        let mut owners: HashMap<&CaseMatcher, &str> = HashMap::new();
        for c in &self.cases {
            if !case_names.insert(c.name.as_str()) {
                return Err(ConfigError::AmbiguousConfiguration(format!(
                    "enum `{name}` declares case `{}` twice",
                    c.name
                )));
            }
            for m in &c.matchers {
                if has_payload && !matches!(m, CaseMatcher::String(_) | CaseMatcher::PathValue(_)) {
                    return Err(ConfigError::AmbiguousConfiguration(format!(
                        "enum `{name}` has associated values; case `{}` may only use string or \
                         path matchers, found {m}",
                        c.name
                    )));
                }
                if let Some(prev) = owners.insert(m, &c.name) {
                    return Err(ConfigError::AmbiguousConfiguration(format!(
                        "enum `{name}`: {m} is declared by both `{prev}` and `{}`",
                        c.name
                    )));
                }
            }
        }

        // each case's encoded tag must decode back to that case
        for (i, c) in self.cases.iter().enumerate() {
            let Some(tag) = c.matchers.first().and_then(CaseMatcher::canonical) else {
                continue;
            };
            let shadowing = self.cases[..i]
                .iter()
                .find(|prev| prev.matchers.iter().any(|m| scalar_matches(m, &tag)));
            if let Some(prev) = shadowing {
                return Err(ConfigError::AmbiguousConfiguration(format!(
                    "enum `{name}`: case `{}` encodes as {tag}, which case `{}` matches first",
                    c.name, prev.name
                )));
            }
        }

        Ok(EnumSpec { name, cases: self.cases, has_payload, tagging: self.tagging })
    }
}

// ------------------------------- Tests ------------------------------------ //

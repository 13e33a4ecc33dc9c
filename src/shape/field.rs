use std::sync::Arc;

use crate::error::ConfigError;
use crate::ir::Ty;
use crate::keys::KeyStyle;
use crate::shape::TypeSpec;
use crate::transform::Transformer;
use crate::value::TypedValue;

/// Decode/encode rules for one struct field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) ty: Ty,
    /// Aliases tried in order; never empty after build.
    pub(crate) keys: Vec<String>,
    /// Dotted path, wins over `keys` when set.
    pub(crate) path: Option<String>,
    pub(crate) encode_key: Option<String>,
    pub(crate) optional: bool,
    pub(crate) default: Option<TypedValue>,
    pub(crate) compact: bool,
    pub(crate) ignore_key_case: bool,
    pub(crate) skip: bool,
    pub(crate) flatten: bool,
    pub(crate) transformer: Option<Arc<dyn Transformer>>,
    keys_explicit: bool,
}

impl FieldSpec {
    pub fn builder(name: impl Into<String>, ty: Ty) -> FieldSpecBuilder {
        FieldSpecBuilder {
            name: name.into(),
            ty,
            keys: Vec::new(),
            path: None,
            encode_key: None,
            default: None,
            compact: false,
            ignore_key_case: false,
            skip: false,
            flatten: false,
            transformer: None,
        }
    }

    /// Field with default rules: read from and written to `name`.
    pub fn new(name: impl Into<String>, ty: Ty) -> Result<Self, ConfigError> {
        Self::builder(name, ty).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ty(&self) -> &Ty {
        &self.ty
    }
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
    pub fn is_optional(&self) -> bool {
        self.optional
    }
    pub fn is_compact(&self) -> bool {
        self.compact
    }
    pub fn default_value(&self) -> Option<&TypedValue> {
        self.default.as_ref()
    }

    /// Key written on encode when no path is set.
    pub fn encode_key(&self) -> &str {
        self.encode_key.as_deref().unwrap_or(&self.keys[0])
    }

    /// Value used when the document has nothing usable for this field.
    /// `None` means the field is required.
    pub(crate) fn fallback(&self) -> Option<TypedValue> {
        if let Some(d) = &self.default {
            return Some(d.clone());
        }
        if self.optional {
            return Some(TypedValue::None);
        }
        if self.compact {
            return self.ty.empty_container();
        }
        None
    }

    pub(crate) fn flattened_shape(&self) -> Option<&TypeSpec> {
        match (&self.ty, self.flatten) {
            (Ty::Shape(s), true) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn apply_key_style(&mut self, style: KeyStyle) {
        if self.keys_explicit || self.path.is_some() {
            return;
        }
        let styled = style.apply(&self.name);
        if styled != self.name {
            self.keys = vec![styled, self.name.clone()];
        }
    }

    pub(crate) fn set_ignore_key_case(&mut self) {
        self.ignore_key_case = true;
    }
}

pub struct FieldSpecBuilder {
    name: String,
    ty: Ty,
    keys: Vec<String>,
    path: Option<String>,
    encode_key: Option<String>,
    default: Option<TypedValue>,
    compact: bool,
    ignore_key_case: bool,
    skip: bool,
    flatten: bool,
    transformer: Option<Arc<dyn Transformer>>,
}

impl FieldSpecBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn encode_key(mut self, key: impl Into<String>) -> Self {
        self.encode_key = Some(key.into());
        self
    }

    pub fn default(mut self, value: impl Into<TypedValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Fall back to the empty container on missing, null, or malformed input.
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    pub fn ignore_key_case(mut self) -> Self {
        self.ignore_key_case = true;
        self
    }

    /// Never read or written.
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Read the nested struct's fields from the enclosing object.
    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }

    pub fn transformer(mut self, t: impl Transformer + 'static) -> Self {
        self.transformer = Some(Arc::new(t));
        self
    }

    pub fn shared_transformer(mut self, t: Arc<dyn Transformer>) -> Self {
        self.transformer = Some(t);
        self
    }

    pub fn build(self) -> Result<FieldSpec, ConfigError> {
        let name = self.name;
        if name.is_empty() {
            return Err(ConfigError::field("", "field name is empty"));
        }
        if self.keys.iter().any(String::is_empty) {
            return Err(ConfigError::field(&name, "empty key alias"));
        }
        if let Some(p) = &self.path {
            if p.split('.').any(str::is_empty) {
                return Err(ConfigError::field(&name, format!("malformed path `{p}`")));
            }
        }
        if matches!(&self.encode_key, Some(k) if k.is_empty()) {
            return Err(ConfigError::field(&name, "empty encode key"));
        }
        if self.compact && !self.ty.is_container() {
            return Err(ConfigError::field(
                &name,
                format!("compact requires a list, set, or map; declared {}", self.ty),
            ));
        }
        let optional = self.ty.is_nullable();
        if self.skip && self.default.is_none() && !optional && !self.compact {
            return Err(ConfigError::field(
                &name,
                "skipped field needs a default, optional type, or compact container",
            ));
        }
        if self.flatten {
            let is_struct = matches!(&self.ty, Ty::Shape(s) if matches!(**s, TypeSpec::Struct(_)));
            if !is_struct {
                return Err(ConfigError::field(&name, "only struct shapes can be flattened"));
            }
            if self.path.is_some() || self.transformer.is_some() {
                let msg = "flattened field cannot have a path or transformer";
                return Err(ConfigError::field(&name, msg));
            }
        }

        let keys_explicit = !self.keys.is_empty();
        let keys = if keys_explicit {
            self.keys
        } else {
            vec![name.clone()]
        };
        Ok(FieldSpec {
            name,
            ty: self.ty,
            keys,
            path: self.path,
            encode_key: self.encode_key,
            optional,
            default: self.default,
            compact: self.compact,
            ignore_key_case: self.ignore_key_case,
            skip: self.skip,
            flatten: self.flatten,
            transformer: self.transformer,
            keys_explicit,
        })
    }
}

// ------------------------------- Tests ------------------------------------ //

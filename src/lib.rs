//! Declarative JSON ⇄ typed value codec.
//!
//! Describe a type once as a [`TypeSpec`] (per-field key aliases, nested
//! paths, defaults, compact containers, transformers; per-case matchers and
//! associated-value keys), then [`decode`] documents into [`TypedValue`]s and
//! [`encode`] them back.
//!
//! ```
//! use json_keyed::{decode, encode, FieldSpec, StructSpec, Ty, TypedValue};
//! use serde_json::json;
//!
//! let spec = StructSpec::builder("User")
//!     .field(FieldSpec::builder("name", Ty::String).keys(["name", "login"]).build()?)
//!     .field(FieldSpec::builder("city", Ty::nullable(Ty::String)).path("address.city").build()?)
//!     .build()?;
//!
//! let user = decode(&json!({"login": "ann", "address": {"city": "Oslo"}}), &spec)?;
//! let record = user.as_record().unwrap();
//! assert_eq!(record.get("name"), Some(&TypedValue::from("ann")));
//! assert_eq!(encode(&user, &spec), json!({"name": "ann", "address": {"city": "Oslo"}}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod codec;
pub mod document;
pub mod error;
pub mod field;
pub mod ir;
pub mod keys;
pub mod manifest;
pub mod matcher;
pub mod path_de;
pub mod payload;
pub mod shape;
pub mod transform;
pub mod value;

mod coerce;

pub use codec::{decode, encode};
pub use document::{Document, NodeKind, navigate};
pub use error::{ConfigError, DecodeError};
pub use ir::Ty;
pub use keys::KeyStyle;
pub use manifest::{Manifest, Registry};
pub use shape::{
    CaseMatcher, CaseSpec, EnumSpec, FieldSpec, Param, Slot, StructSpec, Tagging, TypeSpec,
    ValueSpec,
};
pub use transform::{Base64, DateCoding, FnTransformer, TransformError, Transformer};
pub use value::{Record, TypedValue, Variant};

//! In-memory schema model.
//!
//! The coder does not parse schema languages; it takes an already-parsed
//! description of the record types. A JSON form (IDL style, camelCase keys)
//! is accepted through [`Schema::from_json`]:
//!
//! ```json
//! {
//!   "layoutVersion": 0,
//!   "accounts": [
//!     { "name": "counter", "type": { "kind": "struct", "fields": [
//!       { "name": "n", "type": "u64" }
//!     ] } }
//!   ],
//!   "types": []
//! }
//! ```
//!
//! `layoutVersion` is the format-version marker: when present the coder
//! uses versioned headers, otherwise legacy ones.

use serde::{Deserialize, Serialize};

use crate::error::CoderResult;

/// Record types, the nested type dictionary, and the format marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub accounts: Vec<TypeDef>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_version: Option<u8>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form.
    pub fn from_json(json: &str) -> CoderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_account(mut self, def: TypeDef) -> Self {
        self.accounts.push(def);
        self
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    pub fn with_layout_version(mut self, version: u8) -> Self {
        self.layout_version = Some(version);
        self
    }

    /// Look a name up for a `defined` reference: the type dictionary first,
    /// then the account types.
    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.types
            .iter()
            .chain(self.accounts.iter())
            .find(|def| def.name == name)
    }
}

/// A named struct or enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDefKind,
}

impl TypeDef {
    pub fn structure(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            ty: TypeDefKind::Struct { fields },
        }
    }

    pub fn enumeration(name: impl Into<String>, variants: Vec<EnumVariant>) -> Self {
        Self {
            name: name.into(),
            ty: TypeDefKind::Enum { variants },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDefKind {
    Struct { fields: Vec<Field> },
    Enum { variants: Vec<EnumVariant> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<VariantFields>,
}

impl EnumVariant {
    /// Variant with no payload.
    pub fn unit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: None,
        }
    }

    pub fn named(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields: Some(VariantFields::Named(fields)),
        }
    }

    pub fn tuple(name: impl Into<String>, fields: Vec<FieldType>) -> Self {
        Self {
            name: name.into(),
            fields: Some(VariantFields::Tuple(fields)),
        }
    }
}

/// Payload of an enum variant: `[{ "name": .., "type": .. }]` or `[type, ..]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantFields {
    Named(Vec<Field>),
    Tuple(Vec<FieldType>),
}

/// Field types. Primitive names are plain strings in JSON (`"u64"`), the
/// composite ones are single-key objects (`{ "vec": "u8" }`,
/// `{ "array": ["u8", 32] }`, `{ "defined": "Name" }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    F32,
    F64,
    String,
    Bytes,
    #[serde(alias = "pubkey")]
    PublicKey,
    Option(Box<FieldType>),
    Vec(Box<FieldType>),
    Array(Box<FieldType>, usize),
    Defined(String),
}

impl FieldType {
    pub fn option(inner: FieldType) -> Self {
        Self::Option(Box::new(inner))
    }

    pub fn vec(inner: FieldType) -> Self {
        Self::Vec(Box::new(inner))
    }

    pub fn array(inner: FieldType, len: usize) -> Self {
        Self::Array(Box::new(inner), len)
    }

    pub fn defined(name: impl Into<String>) -> Self {
        Self::Defined(name.into())
    }
}

//! Dynamic record values.
//!
//! A [`Value`] mirrors the shape of a [`FieldType`](crate::FieldType):
//! encoding checks the value against the layout and decoding produces the
//! same variants back, so `decode(encode(v)) == v` for any value that fits.

/// A decoded field or record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    PublicKey([u8; 32]),
    Option(Option<Box<Value>>),
    Vec(Vec<Value>),
    Array(Vec<Value>),
    /// Named fields in declaration order.
    Struct(Vec<(String, Value)>),
    /// Variant name plus its payload: `Unit`, `Struct` or `Array` (tuple).
    Enum { variant: String, fields: Box<Value> },
}

/// Payload of a unit enum variant.
pub const UNIT: Value = Value::Struct(Vec::new());

impl Value {
    /// Build a struct value from `(name, value)` pairs.
    ///
    /// ```
    /// use jiminy_coder::Value;
    ///
    /// let v = Value::record([("n", Value::U64(42))]);
    /// assert_eq!(v.field("n"), Some(&Value::U64(42)));
    /// ```
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Enum value with no payload.
    pub fn unit_variant(variant: impl Into<String>) -> Self {
        Value::Enum {
            variant: variant.into(),
            fields: Box::new(UNIT),
        }
    }

    /// Enum value carrying `fields` (a `Struct` or a tuple `Array`).
    pub fn variant(variant: impl Into<String>, fields: Value) -> Self {
        Value::Enum {
            variant: variant.into(),
            fields: Box::new(fields),
        }
    }

    pub fn some(inner: Value) -> Self {
        Value::Option(Some(Box::new(inner)))
    }

    pub fn none() -> Self {
        Value::Option(None)
    }

    /// Field of a struct value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::U128(_) => "u128",
            Value::I128(_) => "i128",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::PublicKey(_) => "publicKey",
            Value::Option(_) => "option",
            Value::Vec(_) => "vec",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Enum { .. } => "enum",
        }
    }
}

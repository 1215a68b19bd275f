//! Field layouts.
//!
//! A [`Layout`] is the per-type encode/decode capability the coder works
//! against. The coder only ever calls the trait, so any implementation can
//! sit behind a type name; the one built from a [`Schema`] is
//! [`BorshLayout`].
//!
//! Borsh wire rules, all little-endian:
//!
//! | Type | Bytes |
//! |---|---|
//! | `bool` | 1 (`0` or `1`) |
//! | integers / floats | native width |
//! | `publicKey` | 32 |
//! | `string`, `bytes`, `vec<T>` | `u32` length, then items |
//! | `option<T>` | `u8` tag (`0` none, `1` some), then `T` if some |
//! | `array<T, N>` | `N` items, no prefix |
//! | struct | fields in declaration order |
//! | enum | `u8` variant index, then the variant's fields |

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cursor::{DataWriter, SliceCursor};
use crate::error::{CoderError, CoderResult};
use crate::math::{checked_add, checked_mul, static_add};
use crate::schema::{FieldType, Schema, TypeDef, TypeDefKind, VariantFields};
use crate::value::{Value, UNIT};

/// Deepest value nesting accepted on encode or decode.
///
/// Every value-bearing node counts one level; following a `defined`
/// reference does not. A self-referencing list through `option` costs two
/// levels per element (the struct and the option), so such a list may hold
/// up to 64 elements.
pub const MAX_DEPTH: usize = 128;

/// Encode/decode capability for one record type.
///
/// Implementations must be pure: the same value always encodes to the same
/// bytes and nothing is cached between calls.
pub trait Layout: fmt::Debug + Send + Sync {
    /// Exact number of bytes `encode` will write for `value`.
    fn encoded_len(&self, value: &Value) -> CoderResult<usize>;

    /// Write `value` at the writer's position, returning bytes written.
    fn encode(&self, value: &Value, out: &mut DataWriter<'_>) -> CoderResult<usize>;

    /// Read one value from the cursor. Trailing bytes are left unread.
    fn decode(&self, cur: &mut SliceCursor<'_>) -> CoderResult<Value>;

    /// Largest possible encoding, or `None` when the type has
    /// variable-length fields.
    fn max_size(&self) -> Option<usize>;
}

// ── Resolved layout tree ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum Node {
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
    PublicKey,
    Option(Box<Node>),
    Vec(Box<Node>),
    Array(Box<Node>, usize),
    Struct(Vec<(String, Node)>),
    Enum(Vec<VariantNode>),
    /// Index into the shared [`TypeTable`].
    Defined(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct VariantNode {
    name: String,
    shape: VariantShape,
}

#[derive(Debug, Clone)]
pub(crate) enum VariantShape {
    Unit,
    Named(Vec<(String, Node)>),
    Tuple(Vec<Node>),
}

impl Node {
    fn primitive_size(&self) -> Option<usize> {
        Some(match self {
            Node::Bool | Node::U8 | Node::I8 => 1,
            Node::U16 | Node::I16 => 2,
            Node::U32 | Node::I32 | Node::F32 => 4,
            Node::U64 | Node::I64 | Node::F64 => 8,
            Node::U128 | Node::I128 => 16,
            Node::PublicKey => 32,
            _ => return None,
        })
    }

    /// Defined types reachable without an `option`/`vec` indirection.
    fn direct_refs(&self, out: &mut Vec<usize>) {
        match self {
            Node::Defined(id) => out.push(*id),
            Node::Array(inner, _) => inner.direct_refs(out),
            Node::Struct(fields) => fields.iter().for_each(|(_, n)| n.direct_refs(out)),
            Node::Enum(variants) => {
                for v in variants {
                    match &v.shape {
                        VariantShape::Unit => {}
                        VariantShape::Named(fields) => {
                            fields.iter().for_each(|(_, n)| n.direct_refs(out))
                        }
                        VariantShape::Tuple(items) => items.iter().for_each(|n| n.direct_refs(out)),
                    }
                }
            }
            _ => {}
        }
    }
}

/// Every `defined` type a schema's record types reach, resolved once and
/// shared by all layouts built from that schema.
#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    names: Vec<String>,
    nodes: Vec<Node>,
}

impl TypeTable {
    fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    fn max_size(&self, node: &Node, visiting: &mut [bool]) -> Option<usize> {
        if let Some(n) = node.primitive_size() {
            return Some(n);
        }
        match node {
            Node::String | Node::Bytes | Node::Vec(_) => None,
            Node::Option(inner) => static_add(Some(1), self.max_size(inner, visiting)),
            Node::Array(inner, len) => self.max_size(inner, visiting)?.checked_mul(*len),
            Node::Struct(fields) => self.fields_max_size(fields.iter().map(|(_, n)| n), visiting),
            Node::Enum(variants) => {
                let mut widest = 0usize;
                for v in variants {
                    let size = match &v.shape {
                        VariantShape::Unit => Some(0),
                        VariantShape::Named(fields) => {
                            self.fields_max_size(fields.iter().map(|(_, n)| n), visiting)
                        }
                        VariantShape::Tuple(items) => self.fields_max_size(items.iter(), visiting),
                    };
                    widest = widest.max(size?);
                }
                widest.checked_add(1)
            }
            Node::Defined(id) => {
                if visiting[*id] {
                    return None;
                }
                visiting[*id] = true;
                let size = self.max_size(self.node(*id), visiting);
                visiting[*id] = false;
                size
            }
            _ => None,
        }
    }

    fn fields_max_size<'n>(
        &self,
        nodes: impl Iterator<Item = &'n Node>,
        visiting: &mut [bool],
    ) -> Option<usize> {
        let mut total = Some(0usize);
        for n in nodes {
            total = static_add(total, self.max_size(n, visiting));
        }
        total
    }

    fn encoded_len(&self, node: &Node, value: &Value, depth: usize) -> CoderResult<usize> {
        if let Node::Defined(id) = node {
            return self.encoded_len(self.node(*id), value, depth);
        }
        let depth = descend(depth)?;
        if let Some(n) = node.primitive_size() {
            check_primitive(node, value)?;
            return Ok(n);
        }
        match (node, value) {
            (Node::String, Value::String(s)) => checked_add(4, s.len()),
            (Node::Bytes, Value::Bytes(b)) => checked_add(4, b.len()),
            (Node::Option(_), Value::Option(None)) => Ok(1),
            (Node::Option(inner), Value::Option(Some(v))) => {
                checked_add(1, self.encoded_len(inner, v, depth)?)
            }
            (Node::Vec(inner), Value::Vec(items)) => {
                check_vec_len(items.len())?;
                let mut total = 4usize;
                for item in items {
                    total = checked_add(total, self.encoded_len(inner, item, depth)?)?;
                }
                Ok(total)
            }
            (Node::Array(inner, len), Value::Array(items)) => {
                check_array_len(*len, items.len())?;
                if let Some(n) = inner.primitive_size() {
                    items.iter().try_for_each(|v| check_primitive(inner, v))?;
                    return checked_mul(n, *len);
                }
                let mut total = 0usize;
                for item in items {
                    total = checked_add(total, self.encoded_len(inner, item, depth)?)?;
                }
                Ok(total)
            }
            (Node::Struct(fields), Value::Struct(_)) => {
                let mut total = 0usize;
                for (name, n) in fields {
                    let v = struct_field(value, name)?;
                    total = checked_add(total, self.encoded_len(n, v, depth)?)?;
                }
                Ok(total)
            }
            (Node::Enum(variants), Value::Enum { variant, fields }) => {
                let (_, v) = find_variant(variants, variant)?;
                checked_add(1, self.payload_len(v, fields, depth)?)
            }
            (node, value) => Err(kind_mismatch(node, value)),
        }
    }

    fn payload_len(&self, v: &VariantNode, fields: &Value, depth: usize) -> CoderResult<usize> {
        match (&v.shape, fields) {
            (VariantShape::Unit, Value::Struct(f)) if f.is_empty() => Ok(0),
            (VariantShape::Named(named), Value::Struct(_)) => {
                let mut total = 0usize;
                for (name, n) in named {
                    let val = struct_field(fields, name)?;
                    total = checked_add(total, self.encoded_len(n, val, depth)?)?;
                }
                Ok(total)
            }
            (VariantShape::Tuple(items), Value::Array(vals)) => {
                check_array_len(items.len(), vals.len())?;
                let mut total = 0usize;
                for (n, val) in items.iter().zip(vals) {
                    total = checked_add(total, self.encoded_len(n, val, depth)?)?;
                }
                Ok(total)
            }
            (_, other) => Err(CoderError::invalid(format!(
                "payload for variant {} cannot be a {}",
                v.name,
                other.kind()
            ))),
        }
    }

    fn encode(
        &self,
        node: &Node,
        value: &Value,
        w: &mut DataWriter<'_>,
        depth: usize,
    ) -> CoderResult<()> {
        if let Node::Defined(id) = node {
            return self.encode(self.node(*id), value, w, depth);
        }
        let depth = descend(depth)?;
        match (node, value) {
            (Node::Bool, Value::Bool(v)) => w.write_bool(*v),
            (Node::U8, Value::U8(v)) => w.write_u8(*v),
            (Node::I8, Value::I8(v)) => w.write_i8(*v),
            (Node::U16, Value::U16(v)) => w.write_u16(*v),
            (Node::I16, Value::I16(v)) => w.write_i16(*v),
            (Node::U32, Value::U32(v)) => w.write_u32(*v),
            (Node::I32, Value::I32(v)) => w.write_i32(*v),
            (Node::U64, Value::U64(v)) => w.write_u64(*v),
            (Node::I64, Value::I64(v)) => w.write_i64(*v),
            (Node::U128, Value::U128(v)) => w.write_u128(*v),
            (Node::I128, Value::I128(v)) => w.write_i128(*v),
            (Node::F32, Value::F32(v)) => w.write_f32(*v),
            (Node::F64, Value::F64(v)) => w.write_f64(*v),
            (Node::PublicKey, Value::PublicKey(k)) => w.write_address(k),
            (Node::String, Value::String(s)) => {
                w.write_u32(check_vec_len(s.len())?)?;
                w.write_bytes(s.as_bytes())
            }
            (Node::Bytes, Value::Bytes(b)) => {
                w.write_u32(check_vec_len(b.len())?)?;
                w.write_bytes(b)
            }
            (Node::Option(_), Value::Option(None)) => w.write_u8(0),
            (Node::Option(inner), Value::Option(Some(v))) => {
                w.write_u8(1)?;
                self.encode(inner, v, w, depth)
            }
            (Node::Vec(inner), Value::Vec(items)) => {
                w.write_u32(check_vec_len(items.len())?)?;
                items.iter().try_for_each(|item| self.encode(inner, item, w, depth))
            }
            (Node::Array(inner, len), Value::Array(items)) => {
                check_array_len(*len, items.len())?;
                items.iter().try_for_each(|item| self.encode(inner, item, w, depth))
            }
            (Node::Struct(fields), Value::Struct(_)) => fields
                .iter()
                .try_for_each(|(name, n)| self.encode(n, struct_field(value, name)?, w, depth)),
            (Node::Enum(variants), Value::Enum { variant, fields }) => {
                let (tag, v) = find_variant(variants, variant)?;
                w.write_u8(tag)?;
                match (&v.shape, &**fields) {
                    (VariantShape::Unit, Value::Struct(f)) if f.is_empty() => Ok(()),
                    (VariantShape::Named(named), payload @ Value::Struct(_)) => {
                        named.iter().try_for_each(|(name, n)| {
                            self.encode(n, struct_field(payload, name)?, w, depth)
                        })
                    }
                    (VariantShape::Tuple(items), Value::Array(vals)) => {
                        check_array_len(items.len(), vals.len())?;
                        items
                            .iter()
                            .zip(vals)
                            .try_for_each(|(n, val)| self.encode(n, val, w, depth))
                    }
                    (_, other) => Err(CoderError::invalid(format!(
                        "payload for variant {} cannot be a {}",
                        v.name,
                        other.kind()
                    ))),
                }
            }
            (node, value) => Err(kind_mismatch(node, value)),
        }
    }

    fn decode(&self, node: &Node, cur: &mut SliceCursor<'_>, depth: usize) -> CoderResult<Value> {
        if let Node::Defined(id) = node {
            return self.decode(self.node(*id), cur, depth);
        }
        let depth = descend(depth)?;
        Ok(match node {
            Node::Bool => Value::Bool(cur.read_bool()?),
            Node::U8 => Value::U8(cur.read_u8()?),
            Node::I8 => Value::I8(cur.read_i8()?),
            Node::U16 => Value::U16(cur.read_u16()?),
            Node::I16 => Value::I16(cur.read_i16()?),
            Node::U32 => Value::U32(cur.read_u32()?),
            Node::I32 => Value::I32(cur.read_i32()?),
            Node::U64 => Value::U64(cur.read_u64()?),
            Node::I64 => Value::I64(cur.read_i64()?),
            Node::U128 => Value::U128(cur.read_u128()?),
            Node::I128 => Value::I128(cur.read_i128()?),
            Node::F32 => Value::F32(cur.read_f32()?),
            Node::F64 => Value::F64(cur.read_f64()?),
            Node::PublicKey => Value::PublicKey(cur.read_address()?),
            Node::String => {
                let len = cur.read_u32()? as usize;
                let bytes = cur.read_bytes(len)?;
                let s = core::str::from_utf8(bytes)
                    .map_err(|e| CoderError::invalid(format!("string is not utf-8: {e}")))?;
                Value::String(s.to_owned())
            }
            Node::Bytes => {
                let len = cur.read_u32()? as usize;
                Value::Bytes(cur.read_bytes(len)?.to_vec())
            }
            Node::Option(inner) => match cur.read_u8()? {
                0 => Value::Option(None),
                1 => Value::some(self.decode(inner, cur, depth)?),
                tag => return Err(CoderError::invalid(format!("invalid option tag {tag}"))),
            },
            Node::Vec(inner) => {
                let len = cur.read_u32()? as usize;
                // Zero-sized items are rejected when the table is built, so
                // every item takes at least one byte and the remaining
                // length bounds both the allocation and the loop.
                let mut items = Vec::with_capacity(len.min(cur.remaining()));
                for _ in 0..len {
                    items.push(self.decode(inner, cur, depth)?);
                }
                Value::Vec(items)
            }
            Node::Array(inner, len) => {
                let mut items = Vec::with_capacity((*len).min(cur.remaining()));
                for _ in 0..*len {
                    items.push(self.decode(inner, cur, depth)?);
                }
                Value::Array(items)
            }
            Node::Struct(fields) => Value::Struct(self.decode_named(fields, cur, depth)?),
            Node::Enum(variants) => {
                let tag = cur.read_u8()?;
                let v = variants.get(tag as usize).ok_or_else(|| {
                    CoderError::invalid(format!(
                        "enum tag {tag} out of range ({} variants)",
                        variants.len()
                    ))
                })?;
                let fields = match &v.shape {
                    VariantShape::Unit => UNIT,
                    VariantShape::Named(named) => {
                        Value::Struct(self.decode_named(named, cur, depth)?)
                    }
                    VariantShape::Tuple(items) => Value::Array(
                        items
                            .iter()
                            .map(|n| self.decode(n, cur, depth))
                            .collect::<CoderResult<_>>()?,
                    ),
                };
                Value::variant(v.name.clone(), fields)
            }
            Node::Defined(id) => self.decode(self.node(*id), cur, depth)?,
        })
    }

    fn decode_named(
        &self,
        fields: &[(String, Node)],
        cur: &mut SliceCursor<'_>,
        depth: usize,
    ) -> CoderResult<Vec<(String, Value)>> {
        fields
            .iter()
            .map(|(name, n)| Ok((name.clone(), self.decode(n, cur, depth)?)))
            .collect()
    }
}

#[inline]
fn descend(depth: usize) -> CoderResult<usize> {
    if depth >= MAX_DEPTH {
        return Err(CoderError::invalid(format!(
            "value nesting exceeds {MAX_DEPTH} levels"
        )));
    }
    Ok(depth + 1)
}

fn check_primitive(node: &Node, value: &Value) -> CoderResult<()> {
    let ok = matches!(
        (node, value),
        (Node::Bool, Value::Bool(_))
            | (Node::U8, Value::U8(_))
            | (Node::I8, Value::I8(_))
            | (Node::U16, Value::U16(_))
            | (Node::I16, Value::I16(_))
            | (Node::U32, Value::U32(_))
            | (Node::I32, Value::I32(_))
            | (Node::U64, Value::U64(_))
            | (Node::I64, Value::I64(_))
            | (Node::U128, Value::U128(_))
            | (Node::I128, Value::I128(_))
            | (Node::F32, Value::F32(_))
            | (Node::F64, Value::F64(_))
            | (Node::PublicKey, Value::PublicKey(_))
    );
    if ok {
        Ok(())
    } else {
        Err(kind_mismatch(node, value))
    }
}

/// Borsh length prefixes are `u32`.
fn check_vec_len(len: usize) -> CoderResult<u32> {
    u32::try_from(len).map_err(|_| CoderError::invalid(format!("length {len} exceeds u32")))
}

fn check_array_len(expected: usize, actual: usize) -> CoderResult<()> {
    crate::require_eq!(
        expected,
        actual,
        CoderError::invalid(format!("expected {expected} items, got {actual}"))
    );
    Ok(())
}

fn struct_field<'v>(value: &'v Value, name: &str) -> CoderResult<&'v Value> {
    value
        .field(name)
        .ok_or_else(|| CoderError::invalid(format!("missing field {name}")))
}

fn find_variant<'n>(
    variants: &'n [VariantNode],
    name: &str,
) -> CoderResult<(u8, &'n VariantNode)> {
    variants
        .iter()
        .position(|v| v.name == name)
        .map(|i| (i as u8, &variants[i]))
        .ok_or_else(|| CoderError::invalid(format!("unknown enum variant {name}")))
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Bool => "bool",
        Node::U8 => "u8",
        Node::I8 => "i8",
        Node::U16 => "u16",
        Node::I16 => "i16",
        Node::U32 => "u32",
        Node::I32 => "i32",
        Node::U64 => "u64",
        Node::I64 => "i64",
        Node::U128 => "u128",
        Node::I128 => "i128",
        Node::F32 => "f32",
        Node::F64 => "f64",
        Node::String => "string",
        Node::Bytes => "bytes",
        Node::PublicKey => "publicKey",
        Node::Option(_) => "option",
        Node::Vec(_) => "vec",
        Node::Array(..) => "array",
        Node::Struct(_) => "struct",
        Node::Enum(_) => "enum",
        Node::Defined(_) => "defined",
    }
}

fn kind_mismatch(node: &Node, value: &Value) -> CoderError {
    CoderError::invalid(format!(
        "expected {}, got {}",
        node_kind(node),
        value.kind()
    ))
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Lowers schema type definitions into the shared [`TypeTable`].
///
/// Each definition is lowered once. A name is entered in the index before
/// its body is lowered, so self-references resolve to the same slot.
pub(crate) struct Resolver<'s> {
    schema: &'s Schema,
    index: HashMap<String, usize>,
    names: Vec<String>,
    nodes: Vec<Option<Node>>,
}

impl<'s> Resolver<'s> {
    pub(crate) fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            index: HashMap::new(),
            names: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Resolve a named type, returning its slot in the table.
    pub(crate) fn resolve(&mut self, name: &str) -> CoderResult<usize> {
        if let Some(id) = self.index.get(name) {
            return Ok(*id);
        }
        let schema = self.schema;
        let def = schema
            .find_type(name)
            .ok_or_else(|| CoderError::LayoutResolution(format!("type not found: {name}")))?;
        let id = self.nodes.len();
        self.index.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        self.nodes.push(None);
        let node = self.lower_def(def)?;
        self.nodes[id] = Some(node);
        Ok(id)
    }

    fn lower_def(&mut self, def: &TypeDef) -> CoderResult<Node> {
        match &def.ty {
            TypeDefKind::Struct { fields } => Ok(Node::Struct(
                fields
                    .iter()
                    .map(|f| Ok((f.name.clone(), self.lower(&f.ty)?)))
                    .collect::<CoderResult<_>>()?,
            )),
            TypeDefKind::Enum { variants } => {
                if variants.len() > u8::MAX as usize + 1 {
                    return Err(CoderError::LayoutResolution(format!(
                        "enum {} has {} variants, at most 256 fit a u8 tag",
                        def.name,
                        variants.len()
                    )));
                }
                let mut out = Vec::with_capacity(variants.len());
                for v in variants {
                    let shape = match &v.fields {
                        None => VariantShape::Unit,
                        Some(VariantFields::Named(fields)) => VariantShape::Named(
                            fields
                                .iter()
                                .map(|f| Ok((f.name.clone(), self.lower(&f.ty)?)))
                                .collect::<CoderResult<_>>()?,
                        ),
                        Some(VariantFields::Tuple(items)) => VariantShape::Tuple(
                            items.iter().map(|t| self.lower(t)).collect::<CoderResult<_>>()?,
                        ),
                    };
                    out.push(VariantNode {
                        name: v.name.clone(),
                        shape,
                    });
                }
                Ok(Node::Enum(out))
            }
        }
    }

    fn lower(&mut self, ty: &FieldType) -> CoderResult<Node> {
        Ok(match ty {
            FieldType::Bool => Node::Bool,
            FieldType::U8 => Node::U8,
            FieldType::I8 => Node::I8,
            FieldType::U16 => Node::U16,
            FieldType::I16 => Node::I16,
            FieldType::U32 => Node::U32,
            FieldType::I32 => Node::I32,
            FieldType::U64 => Node::U64,
            FieldType::I64 => Node::I64,
            FieldType::U128 => Node::U128,
            FieldType::I128 => Node::I128,
            FieldType::F32 => Node::F32,
            FieldType::F64 => Node::F64,
            FieldType::String => Node::String,
            FieldType::Bytes => Node::Bytes,
            FieldType::PublicKey => Node::PublicKey,
            FieldType::Option(inner) => Node::Option(Box::new(self.lower(inner)?)),
            FieldType::Vec(inner) => Node::Vec(Box::new(self.lower(inner)?)),
            FieldType::Array(inner, len) => Node::Array(Box::new(self.lower(inner)?), *len),
            FieldType::Defined(name) => Node::Defined(self.resolve(name)?),
        })
    }

    /// Freeze the table. Fails if some type contains itself without an
    /// `option` or `vec` in between, since no finite encoding exists.
    pub(crate) fn finish(self) -> CoderResult<Arc<TypeTable>> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.into_iter().enumerate() {
            let node = node.ok_or_else(|| {
                CoderError::LayoutResolution(format!("type {} was never lowered", self.names[id]))
            })?;
            nodes.push(node);
        }
        let table = TypeTable {
            names: self.names,
            nodes,
        };

        // 0 = unvisited, 1 = on the stack, 2 = done
        let mut state = vec![0u8; table.nodes.len()];
        for id in 0..table.nodes.len() {
            check_finite(&table, id, &mut state)?;
        }
        for (id, node) in table.nodes.iter().enumerate() {
            check_vec_items(&table, node, &table.names[id])?;
        }
        Ok(Arc::new(table))
    }
}

fn check_finite(table: &TypeTable, id: usize, state: &mut [u8]) -> CoderResult<()> {
    match state[id] {
        2 => return Ok(()),
        1 => {
            return Err(CoderError::LayoutResolution(format!(
                "type {} contains itself without an option or vec",
                table.names[id]
            )))
        }
        _ => {}
    }
    state[id] = 1;
    let mut refs = Vec::new();
    table.node(id).direct_refs(&mut refs);
    for r in refs {
        check_finite(table, r, state)?;
    }
    state[id] = 2;
    Ok(())
}

/// A `vec` of zero-sized items would let a bare length prefix stand for
/// billions of decoded values, so such collections are refused outright.
fn check_vec_items(table: &TypeTable, node: &Node, owner: &str) -> CoderResult<()> {
    match node {
        Node::Vec(inner) => {
            let mut visiting = vec![false; table.nodes.len()];
            if table.max_size(inner, &mut visiting) == Some(0) {
                let item = match &**inner {
                    Node::Defined(id) => table.names[*id].as_str(),
                    n => node_kind(n),
                };
                return Err(CoderError::LayoutResolution(format!(
                    "type {owner} has a vec of zero-sized {item} items"
                )));
            }
            check_vec_items(table, inner, owner)
        }
        Node::Option(inner) | Node::Array(inner, _) => check_vec_items(table, inner, owner),
        Node::Struct(fields) => fields
            .iter()
            .try_for_each(|(_, n)| check_vec_items(table, n, owner)),
        Node::Enum(variants) => variants.iter().try_for_each(|v| match &v.shape {
            VariantShape::Unit => Ok(()),
            VariantShape::Named(fields) => fields
                .iter()
                .try_for_each(|(_, n)| check_vec_items(table, n, owner)),
            VariantShape::Tuple(items) => {
                items.iter().try_for_each(|n| check_vec_items(table, n, owner))
            }
        }),
        _ => Ok(()),
    }
}

// ── BorshLayout ──────────────────────────────────────────────────────────────

/// Borsh layout for one named schema type.
#[derive(Debug, Clone)]
pub struct BorshLayout {
    name: String,
    root: usize,
    table: Arc<TypeTable>,
    max_size: Option<usize>,
}

impl BorshLayout {
    pub(crate) fn new(name: &str, root: usize, table: Arc<TypeTable>) -> Self {
        let mut visiting = vec![false; table.nodes.len()];
        let max_size = table.max_size(&Node::Defined(root), &mut visiting);
        Self {
            name: name.to_owned(),
            root,
            table,
            max_size,
        }
    }

    /// Build a standalone layout for `name` from `schema`.
    pub fn from_schema(schema: &Schema, name: &str) -> CoderResult<Self> {
        let mut resolver = Resolver::new(schema);
        let root = resolver.resolve(name)?;
        Ok(Self::new(name, root, resolver.finish()?))
    }

    /// Schema name of the type this layout encodes.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> Node {
        Node::Defined(self.root)
    }
}

impl Layout for BorshLayout {
    fn encoded_len(&self, value: &Value) -> CoderResult<usize> {
        self.table.encoded_len(&self.root(), value, 0)
    }

    fn encode(&self, value: &Value, out: &mut DataWriter<'_>) -> CoderResult<usize> {
        let start = out.written();
        self.table.encode(&self.root(), value, out, 0)?;
        Ok(out.written() - start)
    }

    fn decode(&self, cur: &mut SliceCursor<'_>) -> CoderResult<Value> {
        self.table.decode(&self.root(), cur, 0)
    }

    fn max_size(&self) -> Option<usize> {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumVariant, Field};

    fn encode_to_vec(layout: &BorshLayout, value: &Value) -> Vec<u8> {
        let mut buf = vec![0u8; layout.encoded_len(value).unwrap()];
        let mut w = DataWriter::new(&mut buf);
        let n = layout.encode(value, &mut w).unwrap();
        assert_eq!(n, buf.len());
        buf
    }

    fn status_schema() -> Schema {
        Schema::new()
            .with_account(TypeDef::structure(
                "Pool",
                vec![
                    Field::new("fee", FieldType::U16),
                    Field::new("status", FieldType::defined("Status")),
                    Field::new("label", FieldType::option(FieldType::String)),
                ],
            ))
            .with_type(TypeDef::enumeration(
                "Status",
                vec![
                    EnumVariant::unit("Open"),
                    EnumVariant::named("Locked", vec![Field::new("until", FieldType::I64)]),
                    EnumVariant::tuple("Split", vec![FieldType::U8, FieldType::Bool]),
                ],
            ))
    }

    #[test]
    fn struct_encodes_fields_in_declaration_order() {
        let layout = BorshLayout::from_schema(&status_schema(), "Pool").unwrap();
        // Field order in the value does not matter; the layout's does.
        let value = Value::record([
            ("label", Value::some(Value::String("ab".into()))),
            ("status", Value::variant("Locked", Value::record([("until", Value::I64(-1))]))),
            ("fee", Value::U16(0x0102)),
        ]);
        let bytes = encode_to_vec(&layout, &value);
        let mut expected = vec![0x02, 0x01, 1];
        expected.extend_from_slice(&(-1i64).to_le_bytes());
        expected.extend_from_slice(&[1, 2, 0, 0, 0, b'a', b'b']);
        assert_eq!(bytes, expected);

        let decoded = layout.decode(&mut SliceCursor::new(&bytes)).unwrap();
        assert_eq!(decoded.field("fee"), Some(&Value::U16(0x0102)));
        assert_eq!(decoded.field("label"), value.field("label"));
        assert_eq!(decoded.field("status"), value.field("status"));
    }

    #[test]
    fn tuple_and_unit_variants() {
        let layout = BorshLayout::from_schema(&status_schema(), "Status").unwrap();
        let split = Value::variant("Split", Value::Array(vec![Value::U8(9), Value::Bool(false)]));
        assert_eq!(encode_to_vec(&layout, &split), vec![2, 9, 0]);
        assert_eq!(encode_to_vec(&layout, &Value::unit_variant("Open")), vec![0]);

        let decoded = layout.decode(&mut SliceCursor::new(&[2, 9, 0])).unwrap();
        assert_eq!(decoded, split);
        let err = layout.decode(&mut SliceCursor::new(&[3])).unwrap_err();
        assert!(matches!(err, CoderError::InvalidValue(_)));
    }

    #[test]
    fn max_size_tracks_variable_fields() {
        let schema = status_schema();
        // Status: tag + widest variant (i64)
        assert_eq!(BorshLayout::from_schema(&schema, "Status").unwrap().max_size(), Some(9));
        // Pool carries an optional string
        assert_eq!(BorshLayout::from_schema(&schema, "Pool").unwrap().max_size(), None);

        let fixed = Schema::new().with_account(TypeDef::structure(
            "Fixed",
            vec![
                Field::new("key", FieldType::PublicKey),
                Field::new("slots", FieldType::array(FieldType::U32, 3)),
                Field::new("maybe", FieldType::option(FieldType::U64)),
            ],
        ));
        assert_eq!(
            BorshLayout::from_schema(&fixed, "Fixed").unwrap().max_size(),
            Some(32 + 12 + 9)
        );
    }

    #[test]
    fn unresolved_reference_fails() {
        let schema = Schema::new().with_account(TypeDef::structure(
            "Broken",
            vec![Field::new("inner", FieldType::defined("Nowhere"))],
        ));
        let err = BorshLayout::from_schema(&schema, "Broken").unwrap_err();
        assert!(matches!(err, CoderError::LayoutResolution(_)));
    }

    #[test]
    fn recursion_needs_an_indirection() {
        let guarded = Schema::new().with_type(TypeDef::structure(
            "Node",
            vec![
                Field::new("value", FieldType::U8),
                Field::new("next", FieldType::option(FieldType::defined("Node"))),
            ],
        ));
        let layout = BorshLayout::from_schema(&guarded, "Node").unwrap();
        assert_eq!(layout.max_size(), None);
        let list = Value::record([
            ("value", Value::U8(1)),
            (
                "next",
                Value::some(Value::record([("value", Value::U8(2)), ("next", Value::none())])),
            ),
        ]);
        let bytes = encode_to_vec(&layout, &list);
        assert_eq!(bytes, vec![1, 1, 2, 0]);
        assert_eq!(layout.decode(&mut SliceCursor::new(&bytes)).unwrap(), list);

        let unguarded = Schema::new().with_type(TypeDef::structure(
            "Loop",
            vec![Field::new("again", FieldType::array(FieldType::defined("Loop"), 1))],
        ));
        let err = BorshLayout::from_schema(&unguarded, "Loop").unwrap_err();
        assert!(matches!(err, CoderError::LayoutResolution(_)));
    }

    #[test]
    fn value_shape_is_checked_before_writing() {
        let layout = BorshLayout::from_schema(&status_schema(), "Pool").unwrap();
        let wrong = Value::record([
            ("fee", Value::U32(1)),
            ("status", Value::unit_variant("Open")),
            ("label", Value::none()),
        ]);
        assert!(matches!(layout.encoded_len(&wrong), Err(CoderError::InvalidValue(_))));

        let missing = Value::record([("fee", Value::U16(1))]);
        assert!(matches!(layout.encoded_len(&missing), Err(CoderError::InvalidValue(_))));
    }

    #[test]
    fn truncated_input_is_malformed() {
        let layout = BorshLayout::from_schema(&status_schema(), "Pool").unwrap();
        let err = layout.decode(&mut SliceCursor::new(&[1, 0, 1, 0])).unwrap_err();
        assert!(matches!(err, CoderError::MalformedInput { .. }));
    }

    #[test]
    fn huge_vec_prefix_does_not_preallocate() {
        let schema = Schema::new().with_type(TypeDef::structure(
            "Bag",
            vec![Field::new("items", FieldType::vec(FieldType::U64))],
        ));
        let layout = BorshLayout::from_schema(&schema, "Bag").unwrap();
        let err = layout
            .decode(&mut SliceCursor::new(&u32::MAX.to_le_bytes()))
            .unwrap_err();
        assert!(matches!(err, CoderError::MalformedInput { .. }));
    }

    #[test]
    fn vec_of_zero_sized_items_is_refused() {
        let schema = Schema::new()
            .with_account(TypeDef::structure(
                "Bag",
                vec![Field::new("items", FieldType::vec(FieldType::defined("Empty")))],
            ))
            .with_account(TypeDef::structure(
                "Shelf",
                vec![Field::new(
                    "rows",
                    FieldType::option(FieldType::vec(FieldType::array(FieldType::U64, 0))),
                )],
            ))
            .with_type(TypeDef::structure("Empty", vec![]));
        for name in ["Bag", "Shelf"] {
            let err = BorshLayout::from_schema(&schema, name).unwrap_err();
            assert!(matches!(err, CoderError::LayoutResolution(_)), "{name}: {err:?}");
        }
    }

    fn linked_list(len: usize) -> Value {
        (0..len).fold(Value::none(), |next, i| {
            Value::some(Value::record([("value", Value::U8(i as u8)), ("next", next)]))
        })
    }

    #[test]
    fn depth_counts_values_not_type_references() {
        let schema = Schema::new().with_type(TypeDef::structure(
            "Link",
            vec![
                Field::new("value", FieldType::U8),
                Field::new("next", FieldType::option(FieldType::defined("Link"))),
            ],
        ));
        let layout = BorshLayout::from_schema(&schema, "Link").unwrap();
        let unwrap_head = |v: Value| match v {
            Value::Option(Some(head)) => *head,
            other => panic!("expected a head link, got {other:?}"),
        };

        let deepest = unwrap_head(linked_list(64));
        let bytes = encode_to_vec(&layout, &deepest);
        assert_eq!(bytes.len(), 64 * 2);
        assert_eq!(layout.decode(&mut SliceCursor::new(&bytes)).unwrap(), deepest);

        let too_deep = unwrap_head(linked_list(65));
        assert!(matches!(layout.encoded_len(&too_deep), Err(CoderError::InvalidValue(_))));
        let mut bytes = bytes;
        bytes.pop();
        bytes.extend_from_slice(&[1, 0, 0]);
        assert!(matches!(
            layout.decode(&mut SliceCursor::new(&bytes)),
            Err(CoderError::InvalidValue(_))
        ));
    }
}

//! The accounts coder: header + body encode/decode over a layout registry.
//!
//! Two decode entry points, deliberately separate:
//!
//! - [`AccountsCoder::decode`] verifies the discriminator before touching
//!   the body. Use it for bytes of unknown provenance.
//! - [`AccountsCoder::decode_unchecked`] skips the check. Only use it for
//!   bytes already classified by other means (a memcmp-filtered RPC
//!   response, say). Handing it a record of another type is a caller bug:
//!   it may fail, or it may decode garbage that happens to fit.

use log::{trace, warn};
use serde::Serialize;

use crate::checks::{check_discriminator, check_size};
use crate::config::CoderConfig;
use crate::cursor::{DataWriter, SliceCursor};
use crate::error::{CoderError, CoderResult};
use crate::header::{header_payload, header_payload_mut, HeaderCodec, HEADER_LEN};
use crate::layout::Layout;
use crate::math::checked_add;
use crate::registry::LayoutRegistry;
use crate::schema::Schema;
use crate::value::Value;

/// Byte-match filter for a remote account query: records whose bytes at
/// `offset` equal the base58-decoded `bytes`.
///
/// Serializes as `{"offset": .., "bytes": ".."}`, the shape RPC `memcmp`
/// filters take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: String,
}

/// Encodes and decodes typed account records.
///
/// Immutable after construction and `Send + Sync`: share one instance
/// behind an `Arc` or a `static OnceLock` across threads.
///
/// ```rust,ignore
/// let coder = AccountsCoder::new(&schema)?;
/// let data = coder.encode("counter", &Value::record([("n", Value::U64(42))]))?;
/// let value = coder.decode("counter", &data)?;
/// ```
#[derive(Debug)]
pub struct AccountsCoder {
    registry: LayoutRegistry,
    header: HeaderCodec,
    /// `(name, discriminator)` in registration order, for [`decode_any`].
    ///
    /// [`decode_any`]: AccountsCoder::decode_any
    discriminators: Vec<(String, Vec<u8>)>,
}

impl AccountsCoder {
    /// Coder with default settings: `"account"` namespace, header format
    /// from the schema's layout version marker.
    pub fn new(schema: &Schema) -> CoderResult<Self> {
        Self::with_config(schema, CoderConfig::default())
    }

    pub fn with_config(schema: &Schema, config: CoderConfig) -> CoderResult<Self> {
        let registry = LayoutRegistry::build(schema)?;
        let header = HeaderCodec::new(config.resolve_format(schema), config.namespace_str());
        Ok(Self::from_parts(registry, header))
    }

    /// Assemble a coder from a prepared registry (possibly holding
    /// hand-written layouts) and header codec.
    pub fn from_parts(registry: LayoutRegistry, header: HeaderCodec) -> Self {
        let discriminators = registry
            .names()
            .map(|name| (name.to_owned(), header.discriminator(name, None)))
            .collect();
        Self {
            registry,
            header,
            discriminators,
        }
    }

    #[inline]
    pub fn header(&self) -> &HeaderCodec {
        &self.header
    }

    #[inline]
    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    fn layout(&self, type_name: &str) -> CoderResult<&dyn Layout> {
        self.registry
            .get(type_name)
            .ok_or_else(|| CoderError::UnknownType(type_name.to_owned()))
    }

    /// Tag computed for `type_name` at construction.
    fn cached_discriminator(&self, type_name: &str) -> CoderResult<&[u8]> {
        self.discriminators
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, disc)| disc.as_slice())
            .ok_or_else(|| CoderError::UnknownType(type_name.to_owned()))
    }

    /// Header followed by the layout-encoded body, with no padding.
    pub fn encode(&self, type_name: &str, value: &Value) -> CoderResult<Vec<u8>> {
        let layout = self.layout(type_name)?;
        let body_len = layout.encoded_len(value)?;
        let mut data = vec![0u8; checked_add(HEADER_LEN, body_len)?];
        self.header.write_header(&mut data, type_name, None)?;

        let mut w = DataWriter::new(header_payload_mut(&mut data));
        let written = layout.encode(value, &mut w)?;
        if written != body_len {
            return Err(CoderError::invalid(format!(
                "layout for {type_name} wrote {written} bytes, expected {body_len}"
            )));
        }
        trace!("encoded {type_name}: {} bytes", data.len());
        Ok(data)
    }

    /// Verify the discriminator, then decode the body.
    pub fn decode(&self, type_name: &str, data: &[u8]) -> CoderResult<Value> {
        let expected = self.cached_discriminator(type_name)?;
        check_size(data, HEADER_LEN)?;
        if let Err(err) = check_discriminator(
            data,
            self.header.discriminator_offset(),
            expected,
            type_name,
        ) {
            warn!("{err}");
            return Err(err);
        }
        self.decode_unchecked(type_name, data)
    }

    /// Decode the body without looking at the discriminator.
    ///
    /// Skips exactly [`HEADER_LEN`] bytes. Bytes past the end of the body
    /// are ignored, since stored accounts are often allocated larger than
    /// their contents.
    pub fn decode_unchecked(&self, type_name: &str, data: &[u8]) -> CoderResult<Value> {
        let layout = self.layout(type_name)?;
        check_size(data, HEADER_LEN)?;
        let mut cur = SliceCursor::new(header_payload(data));
        let value = layout.decode(&mut cur)?;
        trace!(
            "decoded {type_name}: {} body bytes, {} trailing",
            cur.position(),
            cur.remaining()
        );
        Ok(value)
    }

    /// Identify the record's type from its discriminator and decode it.
    ///
    /// Types are tried in registration order; with a discriminator
    /// collision the first registered type wins.
    pub fn decode_any(&self, data: &[u8]) -> CoderResult<(&str, Value)> {
        let actual = self.header.parse_discriminator(data)?;
        let (name, _) = self
            .discriminators
            .iter()
            .find(|(_, disc)| disc.as_slice() == actual)
            .ok_or_else(|| CoderError::UnknownDiscriminator(actual.to_vec()))?;
        let value = self.decode_unchecked(name, data)?;
        Ok((name.as_str(), value))
    }

    /// Discriminator a registered type is tagged with.
    pub fn discriminator(&self, type_name: &str) -> CoderResult<Vec<u8>> {
        self.cached_discriminator(type_name).map(<[u8]>::to_vec)
    }

    /// Filter matching every stored record of `type_name`.
    pub fn memcmp_filter(&self, type_name: &str) -> CoderResult<MemcmpFilter> {
        self.memcmp_filter_with(type_name, &[])
    }

    /// Filter matching the discriminator followed by `append`, for queries
    /// that also pin leading body bytes.
    ///
    /// In the versioned format the two reserved header bytes sit between
    /// the discriminator and the body, so `append` must account for them
    /// when it is meant to reach the body.
    pub fn memcmp_filter_with(&self, type_name: &str, append: &[u8]) -> CoderResult<MemcmpFilter> {
        let mut bytes = self.discriminator(type_name)?;
        bytes.extend_from_slice(append);
        Ok(MemcmpFilter {
            offset: self.header.discriminator_offset(),
            bytes: bs58::encode(bytes).into_string(),
        })
    }

    /// Offset at which record bodies begin. Always [`HEADER_LEN`].
    #[inline(always)]
    pub const fn body_offset(&self) -> usize {
        HEADER_LEN
    }

    /// Header plus the largest possible body, for pre-allocating account
    /// space. `None` when the type has variable-length fields.
    pub fn size_of(&self, type_name: &str) -> CoderResult<Option<usize>> {
        let layout = self.layout(type_name)?;
        Ok(layout.max_size().and_then(|n| n.checked_add(HEADER_LEN)))
    }
}

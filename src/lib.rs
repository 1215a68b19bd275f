//! **Jiminy Coder** - schema-driven account encoding for off-chain clients.
//!
//! Every record is an 8-byte header followed by a Borsh-encoded body. The
//! header carries a discriminator: the leading bytes of
//! `sha256("account:<TypeName>")`, so raw account data can be mapped back
//! to its type without any other metadata.
//!
//! # Quick-start
//!
//! ```
//! use jiminy_coder::{AccountsCoder, Schema, Value};
//!
//! let schema = Schema::from_json(r#"{
//!     "layoutVersion": 0,
//!     "accounts": [{ "name": "counter", "type": { "kind": "struct", "fields": [
//!         { "name": "n", "type": "u64" }
//!     ] } }]
//! }"#).unwrap();
//!
//! let coder = AccountsCoder::new(&schema).unwrap();
//! let value = Value::record([("n", Value::U64(42))]);
//! let data = coder.encode("counter", &value).unwrap();
//! assert_eq!(data.len(), 16);
//! assert_eq!(coder.decode("counter", &data).unwrap(), value);
//! ```
//!
//! # Header formats
//!
//! | Format | Selected when | Header bytes | Discriminator |
//! |---|---|---|---|
//! | Legacy | schema has no `layoutVersion` | `[disc; 8]` | 8 bytes at offset 0 |
//! | Versioned | schema has `layoutVersion` | `[ver, bump, disc; 4, 0, 0]` | 4 bytes at offset 2 |
//!
//! The header is 8 bytes in both formats; bodies always start at offset 8.
//!
//! # Coder operations
//!
//! | Method | What it does |
//! |---|---|
//! | `encode` | header + body for a registered type |
//! | `decode` | verify discriminator, then decode body |
//! | `decode_unchecked` | decode body, skip the discriminator check |
//! | `decode_any` | find the type by discriminator, then decode |
//! | `memcmp_filter` | base58 `{offset, bytes}` filter for RPC queries |
//! | `size_of` | header + largest body, `None` if variable-length |
//! | `body_offset` | always 8 |
//!
//! # Layouts
//!
//! [`LayoutRegistry`] builds one [`BorshLayout`] per account type when the
//! coder is constructed. Anything implementing [`Layout`] can be registered
//! by hand; the coder only talks to the trait.

mod checks;
mod coder;
mod config;
mod cursor;
mod discriminator;
mod error;
mod header;
mod layout;
mod math;
pub mod prelude;
mod registry;
mod schema;
mod value;

pub use checks::{check_discriminator, check_size};
pub use coder::{AccountsCoder, MemcmpFilter};
pub use config::CoderConfig;
pub use cursor::{DataWriter, SliceCursor};
pub use discriminator::{
    canonical_name, digest, discriminator, discriminator_const, DEFAULT_NAMESPACE,
    DISCRIMINATOR_LEN, VERSIONED_DISCRIMINATOR_LEN,
};
pub use error::{CoderError, CoderResult};
pub use header::{
    header_payload, header_payload_mut, HeaderCodec, HeaderFormat, BUMP_OFFSET, HEADER_LEN,
    HEADER_VERSION, VERSION_OFFSET,
};
pub use layout::{BorshLayout, Layout, MAX_DEPTH};
pub use registry::LayoutRegistry;
pub use schema::{EnumVariant, Field, FieldType, Schema, TypeDef, TypeDefKind, VariantFields};
pub use value::{Value, UNIT};

// ── Macros ───────────────────────────────────────────────────────────────────

/// Require a boolean condition: return `$err` (converted via `Into`) if false.
///
/// ```rust,ignore
/// require!(data.len() >= HEADER_LEN, CoderError::malformed(HEADER_LEN, data.len()));
/// ```
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

/// Require `a == b` for scalar types.
#[macro_export]
macro_rules! require_eq {
    ($a:expr, $b:expr, $err:expr) => {
        if $a != $b {
            return Err($err.into());
        }
    };
}

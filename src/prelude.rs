//! Convenience re-exports for the common coder usage pattern.
//!
//! ```rust,ignore
//! use jiminy_coder::prelude::*;
//! ```

// ── Coder ────────────────────────────────────────────────────────────────────
pub use crate::coder::{AccountsCoder, MemcmpFilter};
pub use crate::config::CoderConfig;

// ── Schema and values ────────────────────────────────────────────────────────
pub use crate::schema::{EnumVariant, Field, FieldType, Schema, TypeDef};
pub use crate::value::Value;

// ── Layouts ──────────────────────────────────────────────────────────────────
pub use crate::layout::{BorshLayout, Layout};
pub use crate::registry::LayoutRegistry;

// ── Header and discriminators ────────────────────────────────────────────────
pub use crate::discriminator::{canonical_name, discriminator_const};
pub use crate::header::{HeaderCodec, HeaderFormat, HEADER_LEN};

// ── Cursors ──────────────────────────────────────────────────────────────────
pub use crate::cursor::{DataWriter, SliceCursor};

// ── Errors ───────────────────────────────────────────────────────────────────
pub use crate::error::{CoderError, CoderResult};

// ── Macros (re-exported from crate root via #[macro_export]) ─────────────────
pub use crate::{require, require_eq};

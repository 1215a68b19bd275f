use thiserror::Error;

/// Everything the coder can fail with.
///
/// All failures are local and synchronous. Nothing is retried: an unknown
/// type or a mismatched discriminator cannot succeed on a second attempt
/// without the caller changing its input.
#[derive(Debug, Error)]
pub enum CoderError {
    /// The type name is not registered with the coder.
    #[error("unknown account type: {0}")]
    UnknownType(String),

    /// The record's discriminator does not belong to the requested type.
    #[error("discriminator mismatch for {type_name}: expected {expected:?}, found {actual:?}")]
    DiscriminatorMismatch {
        type_name: String,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// No registered type owns this discriminator.
    #[error("no account type matches discriminator {0:?}")]
    UnknownDiscriminator(Vec<u8>),

    /// Input is shorter than the header or the body layout requires.
    #[error("malformed input: need {needed} bytes, have {available}")]
    MalformedInput { needed: usize, available: usize },

    /// A value (or decoded byte) does not fit the layout it was given.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The schema references a type that cannot be resolved into a layout.
    #[error("layout resolution failed: {0}")]
    LayoutResolution(String),

    /// The schema document could not be parsed.
    #[error("schema parse error: {0}")]
    Schema(#[from] serde_json::Error),
}

impl CoderError {
    /// Short-input error for a read or write of `needed` bytes against
    /// `available`.
    #[inline]
    pub fn malformed(needed: usize, available: usize) -> Self {
        Self::MalformedInput { needed, available }
    }

    /// Value/layout disagreement.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

/// Result alias used across the crate.
pub type CoderResult<T> = Result<T, CoderError>;

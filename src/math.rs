use crate::error::{CoderError, CoderResult};

/// Checked usize addition: returns `InvalidValue` on overflow.
#[inline(always)]
pub fn checked_add(a: usize, b: usize) -> CoderResult<usize> {
    a.checked_add(b)
        .ok_or_else(|| CoderError::invalid("encoded length overflows usize"))
}

/// Checked usize multiplication: returns `InvalidValue` on overflow.
#[inline(always)]
pub fn checked_mul(a: usize, b: usize) -> CoderResult<usize> {
    a.checked_mul(b)
        .ok_or_else(|| CoderError::invalid("encoded length overflows usize"))
}

/// Sum of two optional static sizes. `None` (variable length) is sticky.
#[inline(always)]
pub fn static_add(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    a?.checked_add(b?)
}

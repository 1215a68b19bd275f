use crate::error::{CoderError, CoderResult};

/// Verify record data is at least `min_len` bytes.
#[inline(always)]
pub fn check_size(data: &[u8], min_len: usize) -> CoderResult<()> {
    crate::require!(
        data.len() >= min_len,
        CoderError::malformed(min_len, data.len())
    );
    Ok(())
}

/// Verify the bytes at `offset` equal `expected`, byte for byte.
///
/// Short data is reported as malformed rather than as a mismatch, so a
/// truncated record is never mistaken for a record of another type.
#[inline(always)]
pub fn check_discriminator(
    data: &[u8],
    offset: usize,
    expected: &[u8],
    type_name: &str,
) -> CoderResult<()> {
    let end = offset + expected.len();
    check_size(data, end)?;
    let actual = &data[offset..end];
    if actual != expected {
        return Err(CoderError::DiscriminatorMismatch {
            type_name: type_name.to_owned(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

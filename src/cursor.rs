use crate::error::{CoderError, CoderResult};

/// Bounds-checked read cursor over a byte slice.
///
/// Tracks the current position and reads little-endian fields sequentially.
/// Every read is bounds-checked: reading past the end yields
/// `MalformedInput` with the number of bytes the read needed, never a panic.
///
/// ```rust,ignore
/// let mut cur = SliceCursor::new(header_payload(&data));
/// let balance   = cur.read_u64()?;
/// let authority = cur.read_address()?;
/// ```
pub struct SliceCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! read_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline(always)]
            pub fn $name(&mut self) -> CoderResult<$ty> {
                let bytes = self.read_bytes(core::mem::size_of::<$ty>())?;
                let mut arr = [0u8; core::mem::size_of::<$ty>()];
                arr.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(arr))
            }
        )*
    };
}

impl<'a> SliceCursor<'a> {
    #[inline(always)]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes remaining from the current position.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Current byte offset into the slice.
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Borrow the next `n` bytes and advance past them.
    #[inline(always)]
    pub fn read_bytes(&mut self, n: usize) -> CoderResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| CoderError::malformed(usize::MAX, self.data.len()))?;
        if end > self.data.len() {
            return Err(CoderError::malformed(end, self.data.len()));
        }
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> CoderResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> CoderResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    read_le! {
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_u128 => u128,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64,
        read_i128 => i128,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// `0` → `false`, `1` → `true`, anything else is rejected. Borsh is
    /// strict here; a lenient read would let two byte strings decode to the
    /// same value.
    #[inline(always)]
    pub fn read_bool(&mut self) -> CoderResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CoderError::invalid(format!("invalid bool byte {other}"))),
        }
    }

    /// 32-byte public key.
    #[inline(always)]
    pub fn read_address(&mut self) -> CoderResult<[u8; 32]> {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(self.read_bytes(32)?);
        Ok(arr)
    }
}

// ── DataWriter ────────────────────────────────────────────────────────────────

/// Bounds-checked write cursor over a mutable byte slice.
///
/// The coder sizes the slice to the exact encoded length up front, so a
/// write past the end means the length computation and the layout disagree.
/// That surfaces as `MalformedInput` rather than a panic.
///
/// All writes are little-endian.
pub struct DataWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

macro_rules! write_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline(always)]
            pub fn $name(&mut self, val: $ty) -> CoderResult<()> {
                self.write_bytes(&val.to_le_bytes())
            }
        )*
    };
}

impl<'a> DataWriter<'a> {
    #[inline(always)]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline(always)]
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Space left in the underlying slice.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline(always)]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CoderResult<()> {
        let end = self.pos + bytes.len();
        if end > self.data.len() {
            return Err(CoderError::malformed(end, self.data.len()));
        }
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    #[inline(always)]
    pub fn write_u8(&mut self, val: u8) -> CoderResult<()> {
        self.write_bytes(&[val])
    }

    #[inline(always)]
    pub fn write_i8(&mut self, val: i8) -> CoderResult<()> {
        self.write_u8(val as u8)
    }

    write_le! {
        write_u16 => u16,
        write_u32 => u32,
        write_u64 => u64,
        write_u128 => u128,
        write_i16 => i16,
        write_i32 => i32,
        write_i64 => i64,
        write_i128 => i128,
        write_f32 => f32,
        write_f64 => f64,
    }

    /// Writes `1u8` for `true`, `0u8` for `false`.
    #[inline(always)]
    pub fn write_bool(&mut self, val: bool) -> CoderResult<()> {
        self.write_u8(val as u8)
    }

    #[inline(always)]
    pub fn write_address(&mut self, addr: &[u8; 32]) -> CoderResult<()> {
        self.write_bytes(addr)
    }
}

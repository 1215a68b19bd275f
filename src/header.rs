use crate::checks::check_size;
use crate::discriminator::{
    discriminator, DEFAULT_NAMESPACE, DISCRIMINATOR_LEN, VERSIONED_DISCRIMINATOR_LEN,
};
use crate::error::{CoderError, CoderResult};

/// Size of the account header, in bytes.
///
/// Fixed for both formats so record bodies always start at the same offset.
///
/// Legacy layout:
/// - Bytes 0-7: discriminator
///
/// Versioned layout:
/// - Byte 0: `u8` format version (currently 0)
/// - Byte 1: `u8` bump (caller-reserved, currently 0)
/// - Bytes 2-5: discriminator
/// - Bytes 6-7: reserved (zero)
pub const HEADER_LEN: usize = 8;

/// Byte offset of the version byte in a versioned header.
pub const VERSION_OFFSET: usize = 0;

/// Byte offset of the bump byte in a versioned header.
pub const BUMP_OFFSET: usize = 1;

/// Format version written into versioned headers.
pub const HEADER_VERSION: u8 = 0;

/// Which header layout records use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFormat {
    /// 8-byte discriminator, no metadata.
    Legacy,
    /// Version + bump + 4-byte discriminator + 2 reserved bytes.
    Versioned,
}

impl HeaderFormat {
    /// Versioned when the schema carries a layout version marker.
    pub fn from_layout_version(layout_version: Option<u8>) -> Self {
        match layout_version {
            Some(_) => HeaderFormat::Versioned,
            None => HeaderFormat::Legacy,
        }
    }

    #[inline(always)]
    pub const fn discriminator_size(self) -> usize {
        match self {
            HeaderFormat::Legacy => DISCRIMINATOR_LEN,
            HeaderFormat::Versioned => VERSIONED_DISCRIMINATOR_LEN,
        }
    }

    #[inline(always)]
    pub const fn discriminator_offset(self) -> usize {
        match self {
            HeaderFormat::Legacy => 0,
            HeaderFormat::Versioned => 2,
        }
    }
}

/// Builds and parses account headers.
///
/// Holds the format and namespace chosen at construction; every other part
/// of the crate asks this type for sizes and offsets instead of branching
/// on the format itself.
///
/// ```rust,ignore
/// let header = HeaderCodec::new(HeaderFormat::Versioned, "account");
/// let bytes = header.encode_header("counter", None);
/// assert_eq!(header.parse_discriminator(&bytes)?, &header.discriminator("counter", None)[..]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCodec {
    format: HeaderFormat,
    namespace: String,
}

impl Default for HeaderCodec {
    fn default() -> Self {
        Self::new(HeaderFormat::Legacy, DEFAULT_NAMESPACE)
    }
}

impl HeaderCodec {
    pub fn new(format: HeaderFormat, namespace: impl Into<String>) -> Self {
        Self {
            format,
            namespace: namespace.into(),
        }
    }

    #[inline(always)]
    pub fn format(&self) -> HeaderFormat {
        self.format
    }

    #[inline(always)]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 8 for legacy headers, 4 for versioned.
    #[inline(always)]
    pub fn discriminator_size(&self) -> usize {
        self.format.discriminator_size()
    }

    /// Where the discriminator sits inside a stored record. Remote memcmp
    /// filters match at this absolute offset.
    #[inline(always)]
    pub fn discriminator_offset(&self) -> usize {
        self.format.discriminator_offset()
    }

    /// Discriminator for `type_name`, truncated to the active width.
    pub fn discriminator(&self, type_name: &str, namespace: Option<&str>) -> Vec<u8> {
        let ns = namespace.unwrap_or(&self.namespace);
        discriminator(ns, type_name, self.discriminator_size())
    }

    /// The full 8-byte header for `type_name`.
    pub fn encode_header(&self, type_name: &str, namespace: Option<&str>) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        let disc = self.discriminator(type_name, namespace);
        let offset = self.discriminator_offset();
        // Versioned: version and bump stay 0, reserved tail stays 0.
        header[offset..offset + disc.len()].copy_from_slice(&disc);
        header
    }

    /// Write the header into the first [`HEADER_LEN`] bytes of `data`.
    pub fn write_header(
        &self,
        data: &mut [u8],
        type_name: &str,
        namespace: Option<&str>,
    ) -> CoderResult<()> {
        if data.len() < HEADER_LEN {
            return Err(CoderError::malformed(HEADER_LEN, data.len()));
        }
        data[..HEADER_LEN].copy_from_slice(&self.encode_header(type_name, namespace));
        Ok(())
    }

    /// Slice the discriminator out of a stored record.
    ///
    /// Rejects input shorter than a full header even though the legacy
    /// discriminator would fit, so both formats fail the same way.
    pub fn parse_discriminator<'a>(&self, data: &'a [u8]) -> CoderResult<&'a [u8]> {
        check_size(data, HEADER_LEN)?;
        let offset = self.discriminator_offset();
        Ok(&data[offset..offset + self.discriminator_size()])
    }

    /// Version byte of a versioned header; `None` for legacy headers.
    pub fn read_version(&self, data: &[u8]) -> CoderResult<Option<u8>> {
        self.read_meta(data, VERSION_OFFSET)
    }

    /// Bump byte of a versioned header; `None` for legacy headers.
    pub fn read_bump(&self, data: &[u8]) -> CoderResult<Option<u8>> {
        self.read_meta(data, BUMP_OFFSET)
    }

    fn read_meta(&self, data: &[u8], offset: usize) -> CoderResult<Option<u8>> {
        check_size(data, HEADER_LEN)?;
        Ok(match self.format {
            HeaderFormat::Legacy => None,
            HeaderFormat::Versioned => Some(data[offset]),
        })
    }
}

/// Return the body slice that follows the header.
///
/// ```rust,ignore
/// let body = header_payload(&data);
/// let mut cur = SliceCursor::new(body);
/// ```
#[inline(always)]
pub fn header_payload(data: &[u8]) -> &[u8] {
    if data.len() <= HEADER_LEN {
        &[]
    } else {
        &data[HEADER_LEN..]
    }
}

/// Return the mutable body slice that follows the header.
#[inline(always)]
pub fn header_payload_mut(data: &mut [u8]) -> &mut [u8] {
    if data.len() <= HEADER_LEN {
        &mut []
    } else {
        &mut data[HEADER_LEN..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: [u8; 8] = [255, 176, 4, 245, 188, 253, 124, 25];

    #[test]
    fn legacy_header_is_the_full_discriminator() {
        let header = HeaderCodec::default();
        assert_eq!(header.discriminator_size(), 8);
        assert_eq!(header.discriminator_offset(), 0);
        assert_eq!(header.encode_header("counter", None), COUNTER);
        assert_eq!(header.parse_discriminator(&COUNTER).unwrap(), &COUNTER);
        assert_eq!(header.read_version(&COUNTER).unwrap(), None);
    }

    #[test]
    fn versioned_header_layout() {
        let header = HeaderCodec::new(HeaderFormat::Versioned, "account");
        assert_eq!(header.discriminator_size(), 4);
        assert_eq!(header.discriminator_offset(), 2);
        let bytes = header.encode_header("counter", None);
        assert_eq!(bytes, [0, 0, 255, 176, 4, 245, 0, 0]);
        assert_eq!(header.parse_discriminator(&bytes).unwrap(), &COUNTER[..4]);
        assert_eq!(header.read_version(&bytes).unwrap(), Some(HEADER_VERSION));
        assert_eq!(header.read_bump(&bytes).unwrap(), Some(0));
    }

    #[test]
    fn namespace_override_applies_per_call() {
        let header = HeaderCodec::default();
        assert_eq!(
            header.discriminator("Counter", Some("state")),
            vec![70, 38, 154, 162, 220, 153, 132, 32]
        );
        assert_eq!(header.discriminator("Counter", None), COUNTER.to_vec());
    }

    #[test]
    fn parse_rejects_short_input_in_both_formats() {
        for format in [HeaderFormat::Legacy, HeaderFormat::Versioned] {
            let header = HeaderCodec::new(format, "account");
            let err = header.parse_discriminator(&[0u8; 7]).unwrap_err();
            assert!(matches!(
                err,
                CoderError::MalformedInput { needed: 8, available: 7 }
            ));
        }
    }

    #[test]
    fn write_header_leaves_body_untouched() {
        let header = HeaderCodec::new(HeaderFormat::Versioned, "account");
        let mut data = [0xAAu8; 12];
        header.write_header(&mut data, "counter", None).unwrap();
        assert_eq!(&data[..8], &[0, 0, 255, 176, 4, 245, 0, 0]);
        assert_eq!(header_payload(&data), &[0xAA; 4]);
        assert!(header.write_header(&mut [0u8; 4], "counter", None).is_err());
    }
}

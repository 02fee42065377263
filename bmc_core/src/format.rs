/// Size of the fixed leading header in bytes.
///   width:u32 + height:u32 + channels:u8 = 4 + 4 + 1 = 9
pub const FIXED_HEADER_SIZE: usize = 9;

/// Size of every length prefix in bytes (u32 little-endian).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Bytes a container occupies beyond its three variable fields:
/// the fixed header plus three length prefixes = 9 + 3 * 4 = 21.
pub const FRAMING_OVERHEAD: u64 = (FIXED_HEADER_SIZE + 3 * LENGTH_PREFIX_SIZE) as u64;

/// Number of leading bytes copied from a source bitmap into `header_data`.
pub const BITMAP_HEADER_SIZE: usize = 54;

// ── Field names (used in error reports) ────────────────────────────────────

pub const FIELD_FIXED_HEADER: &str = "fixed header";
pub const FIELD_HEADER_DATA: &str = "header_data";
pub const FIELD_ENCODING_METADATA: &str = "encoding_metadata";
pub const FIELD_COMPRESSED_DATA: &str = "compressed_data";

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u8 = 0;
pub const CODEC_HUFFMAN: u8 = 1;
pub const CODEC_LZ77: u8 = 2;
pub const CODEC_COMBINED: u8 = 3;
pub const CODEC_ZSTD: u8 = 4;
pub const CODEC_LZ4: u8 = 5;
pub const CODEC_DEFLATE: u8 = 6;

// ── Fixed header ───────────────────────────────────────────────────────────

/// Decoded representation of the 9-byte leading header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl FixedHeader {
    /// Serialize to exactly `FIXED_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_SIZE] {
        let mut buf = [0u8; FIXED_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.width.to_le_bytes());
        buf[4..8].copy_from_slice(&self.height.to_le_bytes());
        buf[8] = self.channels;
        buf
    }

    /// Deserialize from `FIXED_HEADER_SIZE` bytes. Every bit pattern is valid.
    pub fn from_bytes(buf: &[u8; FIXED_HEADER_SIZE]) -> Self {
        Self {
            width: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            height: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            channels: buf[8],
        }
    }
}

// ── Metadata ───────────────────────────────────────────────────────────────

/// Everything stored in a container besides the compressed payload.
///
/// `header_data` and `encoding_metadata` are opaque: the container records
/// their lengths and bytes and never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMetadata {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Copied source-format header (e.g. the first 54 bytes of a BMP).
    pub header_data: Vec<u8>,
    /// Encoder output needed to invert the payload.
    pub encoding_metadata: Vec<u8>,
}

impl ContainerMetadata {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
            ..Self::default()
        }
    }

    pub fn with_header_data(mut self, header_data: impl Into<Vec<u8>>) -> Self {
        self.header_data = header_data.into();
        self
    }

    /// Attach encoder metadata. Anything that is not already bytes must pass
    /// through its canonical byte form here (a `String` becomes UTF-8).
    pub fn with_encoding_metadata(mut self, encoding_metadata: impl Into<Vec<u8>>) -> Self {
        self.encoding_metadata = encoding_metadata.into();
        self
    }

    pub fn fixed_header(&self) -> FixedHeader {
        FixedHeader {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Number of raw pixel bytes the image occupies once decoded.
    pub fn raw_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.channels as u64
    }
}

/// Total on-disk size of a container holding these fields.
pub fn container_size(metadata: &ContainerMetadata, compressed_len: usize) -> u64 {
    FRAMING_OVERHEAD
        + metadata.header_data.len() as u64
        + metadata.encoding_metadata.len() as u64
        + compressed_len as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_header_layout_is_little_endian() {
        let header = FixedHeader {
            width: 0x0102_0304,
            height: 2,
            channels: 3,
        };
        assert_eq!(header.to_bytes(), [4, 3, 2, 1, 2, 0, 0, 0, 3]);
        assert_eq!(FixedHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn container_size_counts_framing() {
        let meta = ContainerMetadata::new(4, 2, 3)
            .with_header_data(&b"BM..."[..])
            .with_encoding_metadata(vec![1, 2]);
        assert_eq!(container_size(&meta, 3), 31);
        assert_eq!(container_size(&ContainerMetadata::default(), 0), 21);
    }

    #[test]
    fn string_encoding_metadata_is_stored_as_utf8() {
        let meta = ContainerMetadata::new(1, 1, 1).with_encoding_metadata("{'compressed': False}");
        assert_eq!(meta.encoding_metadata, b"{'compressed': False}".to_vec());
    }
}

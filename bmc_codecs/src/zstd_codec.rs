use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_ZSTD;

/// Zstandard codec.
///
/// The whole pixel buffer is one zstd frame at the configured level
/// (default: 3). The frame carries its own content size, so no sidecar is
/// written.
///
/// Best for: photographic bitmaps where the hand-written codecs gain little.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> u8 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8], _meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let compressed = zstd::bulk::compress(raw, self.level)?;
        Ok(compressed)
    }

    fn decompress(&self, compressed: &[u8], _meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let raw = zstd::decode_all(compressed)?;
        Ok(raw)
    }
}

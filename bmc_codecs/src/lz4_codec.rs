use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_LZ4;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// LZ4 codec with the raw size prepended to the block.
///
/// Fastest decode of the bundled codecs at a modest ratio.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> u8 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, raw: &[u8], _meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        Ok(compress_prepend_size(raw))
    }

    fn decompress(&self, compressed: &[u8], _meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let raw = decompress_size_prepended(compressed)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        Ok(raw)
    }
}

use std::io::{Read, Write};

use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_DEFLATE;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Zlib-wrapped deflate, for comparison with the LZ77 + Huffman pipeline it
/// generalizes.
pub struct DeflateCodec {
    /// 0 = store, 9 = best.
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl Codec for DeflateCodec {
    fn id(&self) -> u8 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, raw: &[u8], _meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(self.level.min(9)));
        enc.write_all(raw)?;
        Ok(enc.finish()?)
    }

    fn decompress(&self, compressed: &[u8], _meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed).read_to_end(&mut raw)?;
        Ok(raw)
    }
}

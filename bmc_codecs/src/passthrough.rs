use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_PASSTHROUGH;

/// No-op codec: stores the pixels verbatim, with no compression.
///
/// Useful for:
/// - Verifying the container round-trip independently of any codec.
/// - Measuring the framing overhead on its own (always 21 + header + 1 bytes).
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn id(&self) -> u8 {
        CODEC_PASSTHROUGH
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&self, raw: &[u8], _meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8], _meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}

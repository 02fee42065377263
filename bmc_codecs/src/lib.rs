pub mod bitio;
mod combined;
mod deflate_codec;
mod huffman;
mod lz4_codec;
mod lz77;
mod passthrough;
mod zstd_codec;

pub use combined::CombinedCodec;
pub use deflate_codec::DeflateCodec;
pub use huffman::HuffmanCodec;
pub use lz4_codec::Lz4Codec;
pub use lz77::{Lz77Codec, MAX_VARINT};
pub use passthrough::PassThroughCodec;
pub use zstd_codec::ZstdCodec;

use bmc_core::format::{
    CODEC_COMBINED, CODEC_DEFLATE, CODEC_HUFFMAN, CODEC_LZ4, CODEC_LZ77, CODEC_PASSTHROUGH,
    CODEC_ZSTD,
};
use bmc_core::{Codec, EncodingMeta};
use std::sync::Arc;

/// Resolve a codec from the id at the front of a container's encoding
/// metadata.
///
/// Decode-side parameters (LZ77 window, Huffman table) travel in the sidecar,
/// so the default configuration of each codec can invert any payload.
pub fn codec_by_id(id: u8) -> anyhow::Result<Arc<dyn Codec>> {
    match id {
        CODEC_PASSTHROUGH => Ok(Arc::new(PassThroughCodec)),
        CODEC_HUFFMAN => Ok(Arc::new(HuffmanCodec)),
        CODEC_LZ77 => Ok(Arc::new(Lz77Codec::default())),
        CODEC_COMBINED => Ok(Arc::new(CombinedCodec::default())),
        CODEC_ZSTD => Ok(Arc::new(ZstdCodec::default())),
        CODEC_LZ4 => Ok(Arc::new(Lz4Codec)),
        CODEC_DEFLATE => Ok(Arc::new(DeflateCodec::default())),
        _ => anyhow::bail!(
            "unknown codec id {}; supported: 0 (passthrough), 1 (huffman), 2 (lz77), \
             3 (combined), 4 (zstd), 5 (lz4), 6 (deflate)",
            id
        ),
    }
}

/// Compress `raw` with `codec`, returning the payload and the bytes to store
/// as the container's `encoding_metadata` (`[codec_id][sidecar]`).
pub fn encode(codec: &dyn Codec, raw: &[u8]) -> anyhow::Result<(Vec<u8>, Vec<u8>)> {
    let mut meta = EncodingMeta::default();
    let payload = codec.compress(raw, &mut meta)?;
    log::info!(
        "{}: {} raw bytes → {} payload + {} metadata bytes",
        codec.name(),
        raw.len(),
        payload.len(),
        meta.sidecar.len() + 1
    );
    Ok((payload, meta.to_envelope(codec.id())))
}

/// Invert [`encode`]: pick the codec named by the envelope and decompress.
pub fn decode(payload: &[u8], encoding_metadata: &[u8]) -> anyhow::Result<Vec<u8>> {
    let (codec_id, meta) = EncodingMeta::from_envelope(encoding_metadata)?;
    let codec = codec_by_id(codec_id)?;
    log::debug!("decoding {} payload bytes with {}", payload.len(), codec.name());
    codec.decompress(payload, &meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_id_resolves_to_itself() {
        for id in 0..=6u8 {
            assert_eq!(codec_by_id(id).unwrap().id(), id);
        }
        assert!(codec_by_id(7).is_err());
    }

    #[test]
    fn envelope_names_the_codec() {
        let (_, envelope) = encode(&ZstdCodec::default(), b"pixels").unwrap();
        assert_eq!(envelope, vec![CODEC_ZSTD]);
    }
}

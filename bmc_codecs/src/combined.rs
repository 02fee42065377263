use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_COMBINED;

use crate::huffman::HuffmanCodec;
use crate::lz77::Lz77Codec;

/// LZ77 followed by Huffman coding of the token stream.
///
/// Sidecar layout: `[lz77_len:u32][lz77 sidecar][huffman sidecar]`. Each
/// stage may independently fall back to storing its input, so the combined
/// codec never does worse than the raw pixels plus a few bytes of metadata.
///
/// Best for: bitmaps with both repeated runs and a skewed histogram; this is
/// the CLI default.
#[derive(Debug, Clone, Default)]
pub struct CombinedCodec {
    pub lz77: Lz77Codec,
}

impl CombinedCodec {
    pub fn new(lz77: Lz77Codec) -> Self {
        Self { lz77 }
    }
}

impl Codec for CombinedCodec {
    fn id(&self) -> u8 {
        CODEC_COMBINED
    }

    fn name(&self) -> &'static str {
        "combined"
    }

    fn compress(&self, raw: &[u8], meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let mut lz_meta = EncodingMeta::default();
        let tokens = self.lz77.compress(raw, &mut lz_meta)?;

        let mut huff_meta = EncodingMeta::default();
        let payload = HuffmanCodec.compress(&tokens, &mut huff_meta)?;

        let mut sidecar = Vec::with_capacity(4 + lz_meta.sidecar.len() + huff_meta.sidecar.len());
        sidecar.extend_from_slice(&(lz_meta.sidecar.len() as u32).to_le_bytes());
        sidecar.extend_from_slice(&lz_meta.sidecar);
        sidecar.extend_from_slice(&huff_meta.sidecar);
        meta.sidecar = sidecar;

        log::debug!(
            "combined: {} raw → {} after lz77 → {} after huffman",
            raw.len(),
            tokens.len(),
            payload.len()
        );
        Ok(payload)
    }

    fn decompress(&self, compressed: &[u8], meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let sidecar = meta.sidecar.as_slice();
        let (len_bytes, rest) = sidecar
            .split_first_chunk::<4>()
            .ok_or_else(|| anyhow::anyhow!("combined sidecar too short ({} bytes)", sidecar.len()))?;
        let lz_len = u32::from_le_bytes(*len_bytes) as usize;
        if rest.len() < lz_len {
            anyhow::bail!(
                "combined sidecar declares {} lz77 bytes, only {} present",
                lz_len,
                rest.len()
            );
        }
        let (lz_sidecar, huff_sidecar) = rest.split_at(lz_len);

        let tokens = HuffmanCodec.decompress(
            compressed,
            &EncodingMeta {
                sidecar: huff_sidecar.to_vec(),
            },
        )?;
        self.lz77.decompress(
            &tokens,
            &EncodingMeta {
                sidecar: lz_sidecar.to_vec(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_banded_image() {
        // 64x64 RGB with horizontal colour bands.
        let raw: Vec<u8> = (0..64 * 64)
            .flat_map(|i| {
                let band = (i / 64 / 8) as u8;
                [band * 30, 255 - band * 30, 0x40]
            })
            .collect();
        let codec = CombinedCodec::default();
        let mut meta = EncodingMeta::default();
        let packed = codec.compress(&raw, &mut meta).unwrap();
        assert!(packed.len() < raw.len() / 10);
        assert_eq!(codec.decompress(&packed, &meta).unwrap(), raw);
    }

    #[test]
    fn tiny_input_stores_through_both_stages() {
        let raw = b"hi".to_vec();
        let codec = CombinedCodec::default();
        let mut meta = EncodingMeta::default();
        let packed = codec.compress(&raw, &mut meta).unwrap();
        assert_eq!(packed, raw);
        // lz77 len prefix (1), lz77 STORED tag, huffman STORED tag
        assert_eq!(meta.sidecar, vec![1, 0, 0, 0, 0, 0]);
        assert_eq!(codec.decompress(&packed, &meta).unwrap(), raw);
    }

    #[test]
    fn truncated_sidecar_is_rejected() {
        let meta = EncodingMeta {
            sidecar: vec![200, 0, 0, 0, 0],
        };
        assert!(CombinedCodec::default().decompress(&[], &meta).is_err());
    }
}

/// Codec-private metadata written and read by a codec.
///
/// For generic codecs (PassThrough, Zstd, Lz4, Deflate) this is always empty.
/// Huffman stores its code table here, LZ77 its window parameters and the
/// raw length.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EncodingMeta {
    pub sidecar: Vec<u8>,
}

impl EncodingMeta {
    /// Wrap the sidecar into the bytes stored as the container's
    /// `encoding_metadata`: `[codec_id][sidecar...]`.
    pub fn to_envelope(&self, codec_id: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.sidecar.len());
        out.push(codec_id);
        out.extend_from_slice(&self.sidecar);
        out
    }

    /// Split an envelope back into its codec id and sidecar.
    pub fn from_envelope(envelope: &[u8]) -> anyhow::Result<(u8, Self)> {
        let (&codec_id, sidecar) = envelope
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty encoding metadata: no codec id"))?;
        Ok((
            codec_id,
            Self {
                sidecar: sidecar.to_vec(),
            },
        ))
    }
}

/// Core compression abstraction for image payloads.
///
/// Each `Codec` implementation:
/// - Is identified by a stable numeric `id()` stored as the first byte of the
///   container's `encoding_metadata`.
/// - Turns the flattened pixel bytes into an opaque payload, optionally writing
///   whatever it needs to invert that into `EncodingMeta.sidecar`.
pub trait Codec: Send + Sync {
    /// Stable codec ID stored in the encoding metadata envelope.
    fn id(&self) -> u8;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Compress the whole flattened pixel buffer.
    fn compress(&self, raw: &[u8], meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>>;

    /// Invert `compress`. `meta` is the sidecar written by `compress`, verbatim.
    fn decompress(&self, compressed: &[u8], meta: &EncodingMeta) -> anyhow::Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let meta = EncodingMeta {
            sidecar: vec![9, 8, 7],
        };
        let env = meta.to_envelope(3);
        assert_eq!(env, vec![3, 9, 8, 7]);
        let (id, back) = EncodingMeta::from_envelope(&env).unwrap();
        assert_eq!(id, 3);
        assert_eq!(back, meta);
    }

    #[test]
    fn empty_envelope_is_rejected() {
        assert!(EncodingMeta::from_envelope(&[]).is_err());
    }
}

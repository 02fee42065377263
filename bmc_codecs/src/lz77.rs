use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_LZ77;

/// Inputs shorter than this are stored verbatim.
const MIN_INPUT_LEN: usize = 50;

/// Largest value a token varint can carry (15 bits).
pub const MAX_VARINT: u16 = 0x7FFF;

/// Shortest back-reference worth emitting.
const MIN_MATCH: usize = 3;

const HASH_BITS: u32 = 15;
const NO_POS: usize = usize::MAX;

const STORED: u8 = 0;
const CODED: u8 = 1;
/// `[CODED][window:u16][lookahead:u16][raw_len:u32]`
const SIDECAR_LEN: usize = 9;

/// Sliding-window LZ77 codec.
///
/// The payload is a sequence of `[offset][length][literal]` tokens where
/// offset and length are 1- or 2-byte varints (high bit of the first byte
/// set for the 2-byte form). The sidecar records the window parameters and
/// the raw length; decoding stops once the raw length is reached, so the last
/// token's literal may be filler.
///
/// Matches are found through a hash chain over 3-byte prefixes, walking at
/// most `max_chain` candidates per position.
#[derive(Debug, Clone)]
pub struct Lz77Codec {
    /// Furthest back a match may start (1..=32767).
    pub window_size: u16,
    /// Longest match emitted (1..=32767).
    pub lookahead: u16,
    /// Hash-chain candidates examined per position.
    pub max_chain: usize,
}

impl Default for Lz77Codec {
    fn default() -> Self {
        Self {
            window_size: 4096,
            lookahead: 128,
            max_chain: 64,
        }
    }
}

impl Lz77Codec {
    pub fn new(window_size: u16, lookahead: u16, max_chain: usize) -> Self {
        Self {
            window_size: window_size.clamp(1, MAX_VARINT),
            lookahead: lookahead.clamp(1, MAX_VARINT),
            max_chain: max_chain.max(1),
        }
    }

    fn store(raw: &[u8], meta: &mut EncodingMeta) -> Vec<u8> {
        meta.sidecar = vec![STORED];
        raw.to_vec()
    }

    fn encode_tokens(&self, data: &[u8]) -> Vec<u8> {
        let mut matcher = HashChain::new(data.len());
        let mut out = Vec::with_capacity(data.len() / 2);
        let mut pos = 0;

        while pos < data.len() {
            let (offset, length) = self.longest_match(data, pos, &matcher);
            push_varint(&mut out, offset as u16);
            push_varint(&mut out, length as u16);
            let next = pos + length;
            out.push(data.get(next).copied().unwrap_or(0));

            let end = (next + 1).min(data.len());
            for p in pos..end {
                matcher.insert(data, p);
            }
            pos = next + 1;
        }
        out
    }

    fn longest_match(&self, data: &[u8], pos: usize, matcher: &HashChain) -> (usize, usize) {
        let max_len = (self.lookahead.min(MAX_VARINT) as usize).min(data.len() - pos);
        if max_len < MIN_MATCH {
            return (0, 0);
        }
        let window = self.window_size.min(MAX_VARINT) as usize;

        let mut best = (0, 0);
        let mut candidate = matcher.head_for(data, pos);
        let mut steps = 0;
        while candidate != NO_POS && steps < self.max_chain {
            let distance = pos - candidate;
            if distance > window {
                break;
            }
            let len = data[candidate..]
                .iter()
                .zip(&data[pos..pos + max_len])
                .take_while(|(a, b)| a == b)
                .count();
            if len > best.1 {
                best = (distance, len);
                if len == max_len {
                    break;
                }
            }
            candidate = matcher.prev[candidate];
            steps += 1;
        }

        if best.1 < MIN_MATCH {
            (0, 0)
        } else {
            best
        }
    }
}

impl Codec for Lz77Codec {
    fn id(&self) -> u8 {
        CODEC_LZ77
    }

    fn name(&self) -> &'static str {
        "lz77"
    }

    fn compress(&self, raw: &[u8], meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        if raw.len() < MIN_INPUT_LEN {
            log::debug!("lz77: {} byte input below minimum, storing", raw.len());
            return Ok(Self::store(raw, meta));
        }
        let raw_len = u32::try_from(raw.len())
            .map_err(|_| anyhow::anyhow!("lz77 input of {} bytes exceeds u32", raw.len()))?;

        let tokens = self.encode_tokens(raw);
        if tokens.len() >= raw.len() {
            log::debug!("lz77: no gain on {} bytes, storing", raw.len());
            return Ok(Self::store(raw, meta));
        }

        let mut sidecar = Vec::with_capacity(SIDECAR_LEN);
        sidecar.push(CODED);
        sidecar.extend_from_slice(&self.window_size.to_le_bytes());
        sidecar.extend_from_slice(&self.lookahead.to_le_bytes());
        sidecar.extend_from_slice(&raw_len.to_le_bytes());
        meta.sidecar = sidecar;
        Ok(tokens)
    }

    fn decompress(&self, compressed: &[u8], meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let raw_len = match meta.sidecar.as_slice() {
            [STORED, ..] => return Ok(compressed.to_vec()),
            [CODED, _, _, _, _, a, b, c, d] => u32::from_le_bytes([*a, *b, *c, *d]) as usize,
            _ => anyhow::bail!("malformed lz77 sidecar ({} bytes)", meta.sidecar.len()),
        };

        let mut out: Vec<u8> = Vec::new();
        let mut pos = 0;
        while out.len() < raw_len {
            let offset = read_varint(compressed, &mut pos)? as usize;
            let length = read_varint(compressed, &mut pos)? as usize;
            let literal = *compressed
                .get(pos)
                .ok_or_else(|| anyhow::anyhow!("lz77 token truncated at byte {}", pos))?;
            pos += 1;

            if length > 0 {
                if offset == 0 || offset > out.len() {
                    anyhow::bail!(
                        "lz77 back-reference offset {} outside {} decoded bytes",
                        offset,
                        out.len()
                    );
                }
                let start = out.len() - offset;
                // Byte-wise so overlapping references repeat correctly.
                for i in 0..length {
                    let b = out[start + i];
                    out.push(b);
                }
            }
            if out.len() < raw_len {
                out.push(literal);
            }
        }

        if out.len() != raw_len {
            anyhow::bail!("lz77 decoded {} bytes, expected {}", out.len(), raw_len);
        }
        Ok(out)
    }
}

/// Head/prev hash chain keyed on 3-byte prefixes.
struct HashChain {
    head: Vec<usize>,
    prev: Vec<usize>,
}

impl HashChain {
    fn new(len: usize) -> Self {
        Self {
            head: vec![NO_POS; 1 << HASH_BITS],
            prev: vec![NO_POS; len],
        }
    }

    fn hash(data: &[u8], pos: usize) -> Option<usize> {
        let key = data.get(pos..pos + MIN_MATCH)?;
        let v = (key[0] as u32) << 16 | (key[1] as u32) << 8 | key[2] as u32;
        Some((v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize)
    }

    fn head_for(&self, data: &[u8], pos: usize) -> usize {
        Self::hash(data, pos).map_or(NO_POS, |h| self.head[h])
    }

    fn insert(&mut self, data: &[u8], pos: usize) {
        if let Some(h) = Self::hash(data, pos) {
            self.prev[pos] = self.head[h];
            self.head[h] = pos;
        }
    }
}

fn push_varint(out: &mut Vec<u8>, value: u16) {
    if value < 0x80 {
        out.push(value as u8);
    } else {
        out.push((value >> 8) as u8 | 0x80);
        out.push(value as u8);
    }
}

fn read_varint(data: &[u8], pos: &mut usize) -> anyhow::Result<u16> {
    let first = *data
        .get(*pos)
        .ok_or_else(|| anyhow::anyhow!("lz77 token truncated at byte {}", pos))?;
    if first < 0x80 {
        *pos += 1;
        return Ok(first as u16);
    }
    let second = *data
        .get(*pos + 1)
        .ok_or_else(|| anyhow::anyhow!("lz77 varint truncated at byte {}", pos))?;
    *pos += 2;
    Ok(((first & 0x7F) as u16) << 8 | second as u16)
}

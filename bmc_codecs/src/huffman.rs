use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use bmc_core::codec::{Codec, EncodingMeta};
use bmc_core::format::CODEC_HUFFMAN;

use crate::bitio::{BitReader, BitWriter};

/// Inputs shorter than this are stored verbatim.
const MIN_INPUT_LEN: usize = 100;

/// Sidecar tag: payload is the input, unmodified.
const STORED: u8 = 0;
/// Sidecar tag: payload is a Huffman bitstream, `[padding][table]` follows.
const CODED: u8 = 1;

/// A single prefix code: the low `len` bits of `bits`, MSB first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct Code {
    bits: u64,
    len: u8,
}

enum Node {
    Leaf(u8),
    Internal(usize, usize),
}

/// Byte-oriented Huffman codec.
///
/// The code table travels in the sidecar as
/// `[count:u16][symbol:u8][code_len:u8][code bits, MSB-first, ceil(len/8) bytes]...`.
/// Small inputs and inputs that would not shrink are stored as-is.
///
/// Best for: images with a skewed byte histogram (flat colours, palettes).
pub struct HuffmanCodec;

impl HuffmanCodec {
    fn store(raw: &[u8], meta: &mut EncodingMeta) -> Vec<u8> {
        meta.sidecar = vec![STORED];
        raw.to_vec()
    }
}

impl Codec for HuffmanCodec {
    fn id(&self) -> u8 {
        CODEC_HUFFMAN
    }

    fn name(&self) -> &'static str {
        "huffman"
    }

    fn compress(&self, raw: &[u8], meta: &mut EncodingMeta) -> anyhow::Result<Vec<u8>> {
        if raw.len() < MIN_INPUT_LEN {
            log::debug!("huffman: {} byte input below minimum, storing", raw.len());
            return Ok(Self::store(raw, meta));
        }

        let mut freq = [0u64; 256];
        for &b in raw {
            freq[b as usize] += 1;
        }
        let codes = build_codes(&freq)?;

        let mut writer = BitWriter::new();
        for &b in raw {
            let code = codes[b as usize];
            writer.write_bits(code.bits, code.len)?;
        }
        let padding = writer.padding();
        let payload = writer.finish();
        let table = serialize_table(&codes)?;

        if payload.len() + table.len() + 10 >= raw.len() {
            log::debug!("huffman: no gain on {} bytes, storing", raw.len());
            return Ok(Self::store(raw, meta));
        }

        let mut sidecar = Vec::with_capacity(2 + table.len());
        sidecar.push(CODED);
        sidecar.push(padding);
        sidecar.extend_from_slice(&table);
        meta.sidecar = sidecar;
        Ok(payload)
    }

    fn decompress(&self, compressed: &[u8], meta: &EncodingMeta) -> anyhow::Result<Vec<u8>> {
        let (padding, table) = match meta.sidecar.as_slice() {
            [STORED, ..] => return Ok(compressed.to_vec()),
            [CODED, padding, table @ ..] => (*padding, table),
            _ => anyhow::bail!("malformed huffman sidecar ({} bytes)", meta.sidecar.len()),
        };
        if padding >= 8 {
            anyhow::bail!("huffman padding {} out of range", padding);
        }
        let total_bits = (compressed.len() * 8)
            .checked_sub(padding as usize)
            .ok_or_else(|| anyhow::anyhow!("huffman payload shorter than its padding"))?;

        let lookup: HashMap<Code, u8> = deserialize_table(table)?
            .into_iter()
            .map(|(symbol, code)| (code, symbol))
            .collect();

        let mut reader = BitReader::new(compressed);
        let mut out = Vec::with_capacity(total_bits);
        let mut current = Code::default();
        for _ in 0..total_bits {
            current.bits = (current.bits << 1) | reader.read_bit()? as u64;
            current.len += 1;
            if let Some(&symbol) = lookup.get(&current) {
                out.push(symbol);
                current = Code::default();
            } else if current.len == 64 {
                anyhow::bail!(
                    "invalid huffman code ending at bit {}",
                    compressed.len() * 8 - reader.bits_remaining()
                );
            }
        }
        if current.len != 0 {
            anyhow::bail!("huffman stream ends inside a code ({} dangling bits)", current.len);
        }
        Ok(out)
    }
}

/// Build a prefix code for every symbol with non-zero frequency.
///
/// Ties are broken by insertion order so the same histogram always yields the
/// same table. A lone symbol gets the one-bit code `0`.
fn build_codes(freq: &[u64; 256]) -> anyhow::Result<[Code; 256]> {
    let mut nodes: Vec<Node> = Vec::with_capacity(511);
    let mut heap = BinaryHeap::new();
    for (symbol, &weight) in freq.iter().enumerate() {
        if weight > 0 {
            heap.push(Reverse((weight, nodes.len())));
            nodes.push(Node::Leaf(symbol as u8));
        }
    }

    let mut codes = [Code::default(); 256];
    match heap.len() {
        0 => anyhow::bail!("empty frequency table: cannot build codebook"),
        1 => {
            if let Some(Node::Leaf(symbol)) = nodes.first() {
                codes[*symbol as usize] = Code { bits: 0, len: 1 };
            }
            return Ok(codes);
        }
        _ => {}
    }

    while let (Some(Reverse((w_lo, lo))), Some(Reverse((w_hi, hi)))) = (heap.pop(), heap.pop()) {
        heap.push(Reverse((w_lo + w_hi, nodes.len())));
        nodes.push(Node::Internal(lo, hi));
        if heap.len() == 1 {
            break;
        }
    }
    let root = nodes.len() - 1;

    let mut stack = vec![(root, Code::default())];
    while let Some((idx, code)) = stack.pop() {
        match nodes[idx] {
            Node::Leaf(symbol) => codes[symbol as usize] = code,
            Node::Internal(lo, hi) => {
                if code.len == 64 {
                    anyhow::bail!("code length exceeds 64 bits");
                }
                let len = code.len + 1;
                stack.push((lo, Code { bits: code.bits << 1, len }));
                stack.push((hi, Code { bits: (code.bits << 1) | 1, len }));
            }
        }
    }
    Ok(codes)
}

fn serialize_table(codes: &[Code; 256]) -> anyhow::Result<Vec<u8>> {
    let used: Vec<(u8, Code)> = codes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.len > 0)
        .map(|(s, c)| (s as u8, *c))
        .collect();

    let mut out = Vec::with_capacity(2 + used.len() * 3);
    out.extend_from_slice(&(used.len() as u16).to_le_bytes());
    for (symbol, code) in used {
        out.push(symbol);
        out.push(code.len);
        let mut w = BitWriter::new();
        w.write_bits(code.bits, code.len)?;
        out.extend_from_slice(&w.finish());
    }
    Ok(out)
}

fn deserialize_table(table: &[u8]) -> anyhow::Result<Vec<(u8, Code)>> {
    if table.len() < 2 {
        anyhow::bail!("huffman table too short: {} bytes", table.len());
    }
    let count = u16::from_le_bytes([table[0], table[1]]) as usize;
    let mut pos = 2;
    let mut entries = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let (symbol, len) = match table.get(pos..pos + 2) {
            Some(&[symbol, len]) => (symbol, len),
            _ => anyhow::bail!("huffman table truncated at entry {}", entries.len()),
        };
        pos += 2;
        if len == 0 || len > 64 {
            anyhow::bail!("huffman code length {} for symbol {} out of range", len, symbol);
        }
        let n_bytes = (len as usize).div_ceil(8);
        let bits = table
            .get(pos..pos + n_bytes)
            .ok_or_else(|| anyhow::anyhow!("huffman table truncated in code for symbol {}", symbol))?;
        pos += n_bytes;
        let code = BitReader::new(bits).read_bits(len)?;
        entries.push((symbol, Code { bits: code, len }));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed(len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| match i % 10 {
                0..=5 => 0x10,
                6..=8 => 0x80,
                _ => (i % 251) as u8,
            })
            .collect()
    }

    #[test]
    fn round_trip_skewed_data() {
        let raw = skewed(5000);
        let mut meta = EncodingMeta::default();
        let packed = HuffmanCodec.compress(&raw, &mut meta).unwrap();
        assert_eq!(meta.sidecar[0], CODED);
        assert!(packed.len() < raw.len());
        assert_eq!(HuffmanCodec.decompress(&packed, &meta).unwrap(), raw);
    }

    #[test]
    fn short_input_is_stored() {
        let raw = vec![7u8; 99];
        let mut meta = EncodingMeta::default();
        let packed = HuffmanCodec.compress(&raw, &mut meta).unwrap();
        assert_eq!(meta.sidecar, vec![STORED]);
        assert_eq!(packed, raw);
        assert_eq!(HuffmanCodec.decompress(&packed, &meta).unwrap(), raw);
    }

    #[test]
    fn single_symbol_uses_one_bit_code() {
        let raw = vec![0xAB; 1000];
        let mut meta = EncodingMeta::default();
        let packed = HuffmanCodec.compress(&raw, &mut meta).unwrap();
        assert_eq!(packed.len(), 125);
        assert_eq!(HuffmanCodec.decompress(&packed, &meta).unwrap(), raw);
    }

    #[test]
    fn uniform_bytes_do_not_gain() {
        let raw: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
        let mut meta = EncodingMeta::default();
        let packed = HuffmanCodec.compress(&raw, &mut meta).unwrap();
        assert_eq!(meta.sidecar, vec![STORED]);
        assert_eq!(packed, raw);
    }

    #[test]
    fn table_layout_matches_documented_format() {
        let mut freq = [0u64; 256];
        freq[b'a' as usize] = 3;
        freq[b'b' as usize] = 1;
        let codes = build_codes(&freq).unwrap();
        let table = serialize_table(&codes).unwrap();
        // count=2, then ('a', 1, code byte) and ('b', 1, code byte)
        assert_eq!(table.len(), 2 + 3 + 3);
        assert_eq!(&table[..2], &[2, 0]);
        assert_eq!(deserialize_table(&table).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_sidecar_is_rejected() {
        let meta = EncodingMeta { sidecar: vec![9] };
        assert!(HuffmanCodec.decompress(&[0], &meta).is_err());
        let meta = EncodingMeta {
            sidecar: vec![CODED, 0, 5, 0],
        };
        assert!(HuffmanCodec.decompress(&[0], &meta).is_err());
    }
}

//! MSB-first bit writer/reader used by the Huffman codec.
//!
//! The writer pads its final partial byte with zero bits; the reader has no
//! notion of padding, so callers track the number of meaningful bits.

/// Accumulates bits MSB-first into a byte buffer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Partial byte, MSB-aligned.
    acc: u8,
    /// Bits held in `acc` (0-7).
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u8) -> anyhow::Result<()> {
        if count > 64 {
            anyhow::bail!("cannot write {} bits at once (max 64)", count);
        }
        for i in (0..count).rev() {
            let bit = ((value >> i) & 1) as u8;
            self.acc |= bit << (7 - self.filled);
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.acc);
                self.acc = 0;
                self.filled = 0;
            }
        }
        Ok(())
    }

    /// Total bits written so far, including the partial byte.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.filled as usize
    }

    /// Number of zero bits `finish` will append to complete the last byte.
    pub fn padding(&self) -> u8 {
        (8 - self.filled) % 8
    }

    /// Flush the partial byte (zero padded) and return the output.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.acc);
        }
        self.bytes
    }
}

/// Reads bits MSB-first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Bit position, 0 = MSB of `data[0]`.
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn read_bit(&mut self) -> anyhow::Result<bool> {
        let byte = self
            .data
            .get(self.pos / 8)
            .ok_or_else(|| anyhow::anyhow!("unexpected end of bit stream at bit {}", self.pos))?;
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Read `count` bits (max 64) into the low bits of the result.
    pub fn read_bits(&mut self, count: u8) -> anyhow::Result<u64> {
        if count > 64 {
            anyhow::bail!("cannot read {} bits at once (max 64)", count);
        }
        if count as usize > self.bits_remaining() {
            anyhow::bail!(
                "insufficient bits: requested {}, available {}",
                count,
                self.bits_remaining()
            );
        }
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }
}

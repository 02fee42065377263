//! Conversion between bytes and strings of `'0'`/`'1'` characters.
//!
//! Bits are rendered MSB-first, eight characters per byte. The reverse
//! direction is exact only for strings whose length is a multiple of 8.

use std::fmt::Write;

use crate::error::BitStringError;

/// Render `data` as a binary string, e.g. `[5]` → `"00000101"`.
pub fn bytes_to_binary_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8);
    for byte in data {
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:08b}");
    }
    out
}

/// Parse a binary string back into bytes.
///
/// When the length is not a multiple of 8 the pad amount `p = 8 - len % 8` is
/// added to the chunk size, so the string is consumed in chunks of `8 + p`
/// characters and each chunk's value is narrowed to its low 8 bits. Only
/// aligned input round-trips through [`bytes_to_binary_string`].
pub fn binary_string_to_bytes(binary: &str) -> Result<Vec<u8>, BitStringError> {
    let digits = binary.as_bytes();
    let rem = digits.len() % 8;
    let padding = if rem != 0 { 8 - rem } else { 0 };
    let chunk_size = 8 + padding;

    let mut out = Vec::with_capacity(digits.len() / 8 + 1);
    for (chunk_idx, chunk) in digits.chunks(chunk_size).enumerate() {
        // Chunks are at most 15 digits, so a u16 holds the full value.
        let mut value: u16 = 0;
        for (i, &digit) in chunk.iter().enumerate() {
            let bit = match digit {
                b'0' => 0,
                b'1' => 1,
                _ => {
                    let position = chunk_idx * chunk_size + i;
                    return Err(BitStringError::InvalidDigit {
                        position,
                        found: binary[position..].chars().next().unwrap_or('\u{FFFD}'),
                    });
                }
            };
            value = (value << 1) | bit;
        }
        out.push(value as u8);
    }
    Ok(out)
}

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ContainerError, Result};
use crate::format::{
    ContainerMetadata, FIELD_COMPRESSED_DATA, FIELD_ENCODING_METADATA, FIELD_HEADER_DATA,
};

/// The three variable-length fields in on-disk order, paired with their
/// length prefixes.
fn prefixed_fields<'a>(
    compressed_data: &'a [u8],
    metadata: &'a ContainerMetadata,
) -> Result<[(u32, &'a [u8]); 3]> {
    let prefix = |field: &'static str, bytes: &'a [u8]| {
        u32::try_from(bytes.len())
            .map(|len| (len, bytes))
            .map_err(|_| ContainerError::FieldTooLarge {
                field,
                len: bytes.len(),
            })
    };
    Ok([
        prefix(FIELD_HEADER_DATA, metadata.header_data.as_slice())?,
        prefix(FIELD_ENCODING_METADATA, metadata.encoding_metadata.as_slice())?,
        prefix(FIELD_COMPRESSED_DATA, compressed_data)?,
    ])
}

/// Serialize a container to any byte sink.
///
/// # Format layout written
/// ```text
/// [width:u32][height:u32][channels:u8]        ← 9-byte fixed header
/// [H:u32][header_data: H bytes]
/// [E:u32][encoding_metadata: E bytes]
/// [C:u32][compressed_data: C bytes]
/// ```
/// All integers are little-endian. Field lengths are checked before the
/// first byte is written.
pub fn write_container<W: Write>(
    out: &mut W,
    compressed_data: &[u8],
    metadata: &ContainerMetadata,
) -> Result<()> {
    let fields = prefixed_fields(compressed_data, metadata)?;
    out.write_all(&metadata.fixed_header().to_bytes())?;
    for (len, bytes) in fields {
        out.write_all(&len.to_le_bytes())?;
        out.write_all(bytes)?;
    }
    Ok(())
}

/// Save `compressed_data` and `metadata` to a new (or truncated) file at `path`.
///
/// On failure the cause is logged and returned. A failed save may leave the
/// file absent, empty, or truncated; it must not be read back as valid.
pub fn save_container(
    path: impl AsRef<Path>,
    compressed_data: &[u8],
    metadata: &ContainerMetadata,
) -> Result<()> {
    let path = path.as_ref();
    match try_save(path, compressed_data, metadata) {
        Ok(()) => {
            log::debug!(
                "saved container {} ({}x{}x{}, payload {} bytes)",
                path.display(),
                metadata.width,
                metadata.height,
                metadata.channels,
                compressed_data.len()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("error saving compressed file {}: {}", path.display(), e);
            Err(e)
        }
    }
}

fn try_save(path: &Path, compressed_data: &[u8], metadata: &ContainerMetadata) -> Result<()> {
    // Reject oversized fields before creating (and truncating) the file.
    prefixed_fields(compressed_data, metadata)?;

    let mut file = BufWriter::new(File::create(path)?);
    write_container(&mut file, compressed_data, metadata)?;
    file.flush()?;
    Ok(())
}

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ContainerError, Result};
use crate::format::{
    ContainerMetadata, FixedHeader, FIELD_COMPRESSED_DATA, FIELD_ENCODING_METADATA,
    FIELD_FIXED_HEADER, FIELD_HEADER_DATA, FIXED_HEADER_SIZE, LENGTH_PREFIX_SIZE,
};

/// Fill `buf` completely, reporting a short read as `Truncated`.
fn read_fixed<R: Read>(src: &mut R, buf: &mut [u8], field: &'static str) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ContainerError::Truncated {
                    field,
                    expected: buf.len() as u64,
                    available: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read one `[len:u32][bytes]` field.
///
/// The body is pulled through `take(len)` so a corrupt prefix cannot make us
/// allocate more than the source actually holds.
fn read_prefixed<R: Read>(src: &mut R, field: &'static str) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    read_fixed(src, &mut len_buf, field)?;
    let len = u32::from_le_bytes(len_buf) as u64;

    let mut bytes = Vec::new();
    src.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(ContainerError::Truncated {
            field,
            expected: len,
            available: bytes.len() as u64,
        });
    }
    Ok(bytes)
}

/// Deserialize a container from any byte source, in the order written by
/// [`crate::writer::write_container`].
///
/// Bytes after `compressed_data` are left unread.
pub fn read_container<R: Read>(src: &mut R) -> Result<(Vec<u8>, ContainerMetadata)> {
    let mut header_buf = [0u8; FIXED_HEADER_SIZE];
    read_fixed(src, &mut header_buf, FIELD_FIXED_HEADER)?;
    let header = FixedHeader::from_bytes(&header_buf);

    let header_data = read_prefixed(src, FIELD_HEADER_DATA)?;
    let encoding_metadata = read_prefixed(src, FIELD_ENCODING_METADATA)?;
    let compressed_data = read_prefixed(src, FIELD_COMPRESSED_DATA)?;

    Ok((
        compressed_data,
        ContainerMetadata {
            width: header.width,
            height: header.height,
            channels: header.channels,
            header_data,
            encoding_metadata,
        },
    ))
}

/// Load the compressed payload and metadata stored at `path`.
///
/// I/O failures, truncated files and length prefixes that run past the end of
/// the file are logged and returned as errors; no partial data escapes.
pub fn load_container(path: impl AsRef<Path>) -> Result<(Vec<u8>, ContainerMetadata)> {
    let path = path.as_ref();
    match try_load(path) {
        Ok((compressed, metadata)) => {
            log::debug!(
                "loaded container {} ({}x{}x{}, payload {} bytes)",
                path.display(),
                metadata.width,
                metadata.height,
                metadata.channels,
                compressed.len()
            );
            Ok((compressed, metadata))
        }
        Err(e) => {
            log::error!("error loading compressed file {}: {}", path.display(), e);
            Err(e)
        }
    }
}

fn try_load(path: &Path) -> Result<(Vec<u8>, ContainerMetadata)> {
    let mut file = BufReader::new(File::open(path)?);
    let loaded = read_container(&mut file)?;

    let mut probe = [0u8; 1];
    if file.read(&mut probe)? != 0 {
        log::warn!(
            "{} has trailing bytes after compressed_data; ignoring them",
            path.display()
        );
    }
    Ok(loaded)
}

/// Size of the file at `path` in bytes, or 0 if it cannot be queried.
///
/// A missing file and an empty file are indistinguishable through this call.
pub fn file_size(path: impl AsRef<Path>) -> u64 {
    let path = path.as_ref();
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            log::warn!("error getting file size of {}: {}", path.display(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_container;

    fn sample() -> (Vec<u8>, ContainerMetadata) {
        let meta = ContainerMetadata::new(640, 480, 3)
            .with_header_data(vec![0x42, 0x4D, 0x36])
            .with_encoding_metadata(vec![1, 2, 3, 4]);
        (vec![0xAA; 17], meta)
    }

    #[test]
    fn reads_back_what_was_written() {
        let (payload, meta) = sample();
        let mut buf = Vec::new();
        write_container(&mut buf, &payload, &meta).unwrap();

        let (got_payload, got_meta) = read_container(&mut buf.as_slice()).unwrap();
        assert_eq!(got_payload, payload);
        assert_eq!(got_meta, meta);
    }

    #[test]
    fn every_truncation_point_is_an_error() {
        let (payload, meta) = sample();
        let mut buf = Vec::new();
        write_container(&mut buf, &payload, &meta).unwrap();

        for cut in 0..buf.len() {
            let result = read_container(&mut &buf[..cut]);
            assert!(
                matches!(result, Err(ContainerError::Truncated { .. })),
                "cut at {cut} should be truncated, got {result:?}"
            );
        }
    }

    #[test]
    fn oversized_prefix_reports_available_bytes() {
        let mut buf = vec![1, 0, 0, 0, 1, 0, 0, 0, 1];
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(b"abc");

        match read_container(&mut buf.as_slice()) {
            Err(ContainerError::Truncated {
                field,
                expected,
                available,
            }) => {
                assert_eq!(field, FIELD_HEADER_DATA);
                assert_eq!(expected, u32::MAX as u64);
                assert_eq!(available, 3);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }
}

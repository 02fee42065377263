pub mod bits;
pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use bits::{binary_string_to_bytes, bytes_to_binary_string};
pub use codec::{Codec, EncodingMeta};
pub use error::{BitStringError, ContainerError, Result};
pub use format::{ContainerMetadata, FixedHeader, FIXED_HEADER_SIZE};
pub use reader::{file_size, load_container, read_container};
pub use writer::{save_container, write_container};

//! Bitmap I/O and pixel flattening on top of the `image` crate.
//!
//! - `read_bitmap`: decode an image and keep its leading header bytes.
//! - `write_bitmap`: save pixels as a BMP.
//! - `flatten` / `unflatten`: move between an image and its row-major
//!   `height × width × channels` byte buffer.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use bmc_core::format::BITMAP_HEADER_SIZE;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

/// Dimensions of a flattened pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelShape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl PixelShape {
    /// Bytes in the flattened buffer.
    pub fn byte_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.channels as u64
    }
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub pixels: Vec<u8>,
    /// First `BITMAP_HEADER_SIZE` bytes of the source file (fewer if shorter).
    pub header: Vec<u8>,
    pub shape: PixelShape,
}

/// Decode the image at `path` and copy its header bytes.
pub fn read_bitmap(path: &Path) -> anyhow::Result<Bitmap> {
    let img = image::open(path).with_context(|| format!("decoding image {}", path.display()))?;

    let mut header = Vec::with_capacity(BITMAP_HEADER_SIZE);
    File::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .take(BITMAP_HEADER_SIZE as u64)
        .read_to_end(&mut header)?;

    let (pixels, shape) = flatten(img);
    log::debug!(
        "read {} ({}x{}x{}, header {} bytes)",
        path.display(),
        shape.width,
        shape.height,
        shape.channels,
        header.len()
    );
    Ok(Bitmap {
        pixels,
        header,
        shape,
    })
}

/// Save `img` to `path` in BMP format.
pub fn write_bitmap(path: &Path, img: &DynamicImage) -> anyhow::Result<()> {
    img.save_with_format(path, ImageFormat::Bmp)
        .with_context(|| format!("writing bitmap {}", path.display()))
}

/// Flatten an image into raw 8-bit samples.
///
/// 8-bit gray, gray+alpha, RGB and RGBA keep their channel count; any other
/// colour type is converted to RGBA8.
pub fn flatten(img: DynamicImage) -> (Vec<u8>, PixelShape) {
    let (width, height) = (img.width(), img.height());
    let (pixels, channels) = match img {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        other => (other.to_rgba8().into_raw(), 4),
    };
    (
        pixels,
        PixelShape {
            width,
            height,
            channels,
        },
    )
}

/// Rebuild an image from a flattened buffer.
pub fn unflatten(flat: Vec<u8>, shape: PixelShape) -> anyhow::Result<DynamicImage> {
    if flat.len() as u64 != shape.byte_len() {
        anyhow::bail!(
            "pixel buffer is {} bytes, expected {}x{}x{} = {}",
            flat.len(),
            shape.width,
            shape.height,
            shape.channels,
            shape.byte_len()
        );
    }
    let PixelShape {
        width: w,
        height: h,
        channels,
    } = shape;
    let img = match channels {
        1 => GrayImage::from_raw(w, h, flat).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(w, h, flat).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(w, h, flat).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, flat).map(DynamicImage::ImageRgba8),
        n => anyhow::bail!("unsupported channel count {}", n),
    };
    img.ok_or_else(|| anyhow::anyhow!("pixel buffer does not fit {}x{}", w, h))
}

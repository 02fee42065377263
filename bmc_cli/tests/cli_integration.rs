use std::path::Path;
use std::process::Command;

use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_bmc").to_string()
}

/// Write a 48x32 BMP with vertical stripes and return its pixels.
fn write_striped_bmp(path: &Path) -> Vec<u8> {
    let img = RgbImage::from_fn(48, 32, |x, _| match (x / 6) % 3 {
        0 => Rgb([255, 0, 0]),
        1 => Rgb([0, 255, 0]),
        _ => Rgb([0, 0, 255]),
    });
    img.save_with_format(path, image::ImageFormat::Bmp).unwrap();
    img.into_raw()
}

#[test]
fn cli_compress_decompress_roundtrip_every_codec() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.bmp");
    let pixels = write_striped_bmp(&source);

    for codec in ["combined", "huffman", "lz77", "zstd", "lz4", "deflate", "passthrough"] {
        let packed = dir.path().join(format!("{codec}.bmc"));
        let restored = dir.path().join(format!("{codec}.bmp"));

        let st = Command::new(bin())
            .args(["compress", "--verify", "--codec", codec])
            .arg(&source)
            .arg(&packed)
            .status()
            .unwrap();
        assert!(st.success(), "compress with {codec}");

        let st = Command::new(bin())
            .arg("decompress")
            .arg(&packed)
            .arg(&restored)
            .status()
            .unwrap();
        assert!(st.success(), "decompress with {codec}");

        let back = image::open(&restored).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (48, 32));
        assert_eq!(back.into_raw(), pixels, "pixels after {codec}");
    }
}

#[test]
fn cli_container_keeps_bmp_header() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.bmp");
    write_striped_bmp(&source);
    let packed = dir.path().join("out.bmc");

    let st = Command::new(bin())
        .arg("compress")
        .arg(&source)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let (_, meta) = bmc_core::load_container(&packed).unwrap();
    let original = std::fs::read(&source).unwrap();
    assert_eq!((meta.width, meta.height, meta.channels), (48, 32, 3));
    assert_eq!(meta.header_data, original[..54].to_vec());
    assert_eq!(meta.encoding_metadata[0], bmc_core::format::CODEC_COMBINED);
}

#[test]
fn cli_inspect_prints_metadata_and_bits() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.bmp");
    write_striped_bmp(&source);
    let packed = dir.path().join("out.bmc");

    let st = Command::new(bin())
        .args(["compress", "--codec", "passthrough"])
        .arg(&source)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .args(["inspect", "--bits", "3"])
        .arg(&packed)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("48x32"), "{stdout}");
    assert!(stdout.contains("passthrough (id=0)"), "{stdout}");
    // First pixel is pure red.
    assert!(stdout.contains("11111111 00000000 00000000"), "{stdout}");
}

#[test]
fn cli_rejects_truncated_container() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.bmp");
    write_striped_bmp(&source);
    let packed = dir.path().join("out.bmc");

    let st = Command::new(bin())
        .arg("compress")
        .arg(&source)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let bytes = std::fs::read(&packed).unwrap();
    std::fs::write(&packed, &bytes[..bytes.len() / 2]).unwrap();

    let out = Command::new(bin())
        .arg("decompress")
        .arg(&packed)
        .arg(dir.path().join("never.bmp"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("truncated"));
    assert!(!dir.path().join("never.bmp").exists());
}

#[test]
fn cli_unknown_codec_fails() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.bmp");
    write_striped_bmp(&source);

    let st = Command::new(bin())
        .args(["compress", "--codec", "bogus"])
        .arg(&source)
        .arg(dir.path().join("out.bmc"))
        .status()
        .unwrap();
    assert!(!st.success());
}

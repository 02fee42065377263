mod bitmap;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use xxhash_rust::xxh3::xxh3_64;

use bmc_codecs::{
    codec_by_id, CombinedCodec, DeflateCodec, HuffmanCodec, Lz4Codec, Lz77Codec,
    PassThroughCodec, ZstdCodec,
};
use bmc_core::format::{container_size, BITMAP_HEADER_SIZE};
use bmc_core::{
    bytes_to_binary_string, file_size, load_container, save_container, Codec, ContainerMetadata,
    EncodingMeta,
};

use crate::bitmap::{read_bitmap, unflatten, write_bitmap, PixelShape};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bmc",
    about = "Bitmap compressor: pack images into BMC containers and back",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an image into a BMC container
    Compress {
        /// Source image (BMP, or any format the image decoder understands)
        input: PathBuf,
        /// Destination container
        output: PathBuf,
        /// Codec: combined | huffman | lz77 | zstd | lz4 | deflate | passthrough
        #[arg(short, long, default_value = "combined")]
        codec: String,
        /// Zstd compression level (1–22, only used with --codec zstd)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
        /// LZ77 sliding window in bytes (lz77 / combined)
        #[arg(long, default_value_t = 4096)]
        window_size: u16,
        /// LZ77 longest match in bytes (lz77 / combined)
        #[arg(long, default_value_t = 128)]
        lookahead: u16,
        /// LZ77 hash-chain candidates per position (lz77 / combined)
        #[arg(long, default_value_t = 64)]
        max_chain: usize,
        /// Reload the container and check the pixels decode identically
        #[arg(long)]
        verify: bool,
    },
    /// Restore a BMC container to a BMP image
    Decompress {
        /// Source container
        input: PathBuf,
        /// Destination BMP
        output: PathBuf,
    },
    /// Print container metadata and field statistics
    Inspect {
        /// Container to inspect
        file: PathBuf,
        /// Show the first N payload bytes as a bit string
        #[arg(long, value_name = "N")]
        bits: Option<usize>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

struct CodecArgs {
    zstd_level: i32,
    window_size: u16,
    lookahead: u16,
    max_chain: usize,
}

fn codec_from_name(name: &str, args: &CodecArgs) -> anyhow::Result<Box<dyn Codec>> {
    let lz77 = || Lz77Codec::new(args.window_size, args.lookahead, args.max_chain);
    match name {
        "combined" | "c" => Ok(Box::new(CombinedCodec::new(lz77()))),
        "huffman" | "h" => Ok(Box::new(HuffmanCodec)),
        "lz77" => Ok(Box::new(lz77())),
        "zstd" | "z" => Ok(Box::new(ZstdCodec::new(args.zstd_level))),
        "lz4" | "l" => Ok(Box::new(Lz4Codec)),
        "deflate" | "d" => Ok(Box::new(DeflateCodec::default())),
        "passthrough" | "pass" | "none" => Ok(Box::new(PassThroughCodec)),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: combined, huffman, lz77, zstd, lz4, deflate, passthrough",
            other
        ),
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn ratio(original: u64, packed: u64) -> f64 {
    if packed == 0 {
        return 0.0;
    }
    original as f64 / packed as f64
}

/// Load a container and run its payload back through the recorded codec.
fn decode_container(path: &Path) -> anyhow::Result<(Vec<u8>, ContainerMetadata)> {
    let (payload, meta) =
        load_container(path).with_context(|| format!("reading container {:?}", path))?;
    let pixels = bmc_codecs::decode(&payload, &meta.encoding_metadata)
        .with_context(|| format!("decoding payload of {:?}", path))?;
    if pixels.len() as u64 != meta.raw_len() {
        anyhow::bail!(
            "decompressed size mismatch: expected {}x{}x{} = {}, got {}",
            meta.width,
            meta.height,
            meta.channels,
            meta.raw_len(),
            pixels.len()
        );
    }
    Ok((pixels, meta))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    args: CodecArgs,
    verify: bool,
) -> anyhow::Result<()> {
    let codec = codec_from_name(codec_name, &args)?;
    let t0 = Instant::now();

    let bmp = read_bitmap(&input)?;
    let (payload, encoding_metadata) = bmc_codecs::encode(codec.as_ref(), &bmp.pixels)
        .with_context(|| format!("compressing with {}", codec.name()))?;

    let meta = ContainerMetadata::new(bmp.shape.width, bmp.shape.height, bmp.shape.channels)
        .with_header_data(bmp.header)
        .with_encoding_metadata(encoding_metadata);
    save_container(&output, &payload, &meta)
        .with_context(|| format!("writing container {:?}", output))?;
    let elapsed = t0.elapsed();

    if verify {
        let (restored, _) = decode_container(&output)?;
        let (want, got) = (xxh3_64(&bmp.pixels), xxh3_64(&restored));
        if want != got {
            anyhow::bail!("verification failed: pixels {:016x}, restored {:016x}", want, got);
        }
        eprintln!("  verified    : xxh3 {:016x}", got);
    }

    let orig_size = file_size(&input);
    let comp_size = file_size(&output);
    eprintln!("  codec       : {}", codec.name());
    eprintln!(
        "  image       : {}x{}x{}",
        meta.width, meta.height, meta.channels
    );
    eprintln!("  original    : {}", human_bytes(orig_size));
    eprintln!("  compressed  : {}", human_bytes(comp_size));
    eprintln!("  ratio       : {:.2}:1", ratio(orig_size, comp_size));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let (pixels, meta) = decode_container(&input)?;
    let shape = PixelShape {
        width: meta.width,
        height: meta.height,
        channels: meta.channels,
    };
    let img = unflatten(pixels, shape)?;
    write_bitmap(&output, &img)?;
    let elapsed = t0.elapsed();

    let comp_size = file_size(&input);
    let out_size = file_size(&output);
    eprintln!(
        "  image       : {}x{}x{}",
        meta.width, meta.height, meta.channels
    );
    eprintln!("  compressed  : {}", human_bytes(comp_size));
    eprintln!("  restored    : {}", human_bytes(out_size));
    eprintln!("  ratio       : {:.2}:1", ratio(out_size, comp_size));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, bits: Option<usize>) -> anyhow::Result<()> {
    let (payload, meta) =
        load_container(&file).with_context(|| format!("reading container {:?}", file))?;
    let size_on_disk = file_size(&file);

    let codec_label = match EncodingMeta::from_envelope(&meta.encoding_metadata) {
        Ok((id, _)) => match codec_by_id(id) {
            Ok(codec) => format!("{} (id={})", codec.name(), id),
            Err(_) => format!("unknown (id={})", id),
        },
        Err(_) => "none".to_string(),
    };
    let header_sig = match meta.header_data.get(..2) {
        Some(b"BM") => "BMP",
        Some(_) => "other",
        None => "absent",
    };

    println!("=== BMC container: {:?} ===", file);
    println!();
    println!("  dimensions        : {}x{}", meta.width, meta.height);
    println!("  channels          : {}", meta.channels);
    println!(
        "  header_data       : {} ({})",
        human_bytes(meta.header_data.len() as u64),
        header_sig
    );
    println!("  codec             : {}", codec_label);
    println!(
        "  encoding_metadata : {}",
        human_bytes(meta.encoding_metadata.len() as u64)
    );
    println!("  compressed_data   : {}", human_bytes(payload.len() as u64));
    println!("  payload xxh3      : {:016x}", xxh3_64(&payload));
    println!("  raw pixels        : {}", human_bytes(meta.raw_len()));
    println!(
        "  file on disk      : {} (expected {})",
        human_bytes(size_on_disk),
        human_bytes(container_size(&meta, payload.len()))
    );
    println!(
        "  ratio             : {:.2}:1",
        ratio(meta.raw_len(), size_on_disk)
    );

    if let Some(n) = bits {
        let shown = &payload[..payload.len().min(n)];
        println!();
        println!("--- first {} payload bytes ---", shown.len());
        for (i, chunk) in shown.chunks(8).enumerate() {
            let line = bytes_to_binary_string(chunk);
            let groups: Vec<&str> = (0..chunk.len()).map(|j| &line[j * 8..j * 8 + 8]).collect();
            println!("  {:04x}  {}", i * 8, groups.join(" "));
        }
    }

    if meta.header_data.len() > BITMAP_HEADER_SIZE {
        log::warn!(
            "header_data is {} bytes, longer than a BMP header",
            meta.header_data.len()
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            zstd_level,
            window_size,
            lookahead,
            max_chain,
            verify,
        } => run_compress(
            input,
            output,
            &codec,
            CodecArgs {
                zstd_level,
                window_size,
                lookahead,
                max_chain,
            },
            verify,
        ),
        Commands::Decompress { input, output } => run_decompress(input, output),
        Commands::Inspect { file, bits } => run_inspect(file, bits),
    }
}

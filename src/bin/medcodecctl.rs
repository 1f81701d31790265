//! medcodecctl - inspect and exercise the native codec integration core.
//!
//! A developer tool for driving the registry and adapters end-to-end
//! without a full DICOM stack: decode, encode, report build info, and list
//! the codecs registered at native priority.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use medcodec_native::facade;

#[derive(Parser)]
#[command(name = "medcodecctl")]
#[command(author = "medcodec-native contributors")]
#[command(version)]
#[command(about = "Exercise the native codec integration core's registry and adapters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a compressed frame via its registered transfer-syntax adapter
    #[command(visible_alias = "d")]
    Decode {
        /// Transfer-syntax identifier to look up in the registry
        #[arg(short, long)]
        transfer_syntax: String,
        /// Input compressed file
        #[arg(short, long)]
        input: PathBuf,
        /// Output raw pixel file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encode a raw raster via its registered transfer-syntax adapter
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long)]
        transfer_syntax: String,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        width: u32,
        #[arg(short = 'H', long)]
        height: u32,
        #[arg(short = 'n', long, default_value = "1")]
        components: u16,
        #[arg(short, long, default_value = "8")]
        bits_per_sample: u8,
    },

    /// Print ABI version, linked feature mask and detected SIMD mask
    #[command(visible_alias = "b")]
    BuildInfo,

    /// List codecs currently registered at native priority
    #[command(visible_alias = "l")]
    ListCodecs,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { transfer_syntax, input, output } => decode(&transfer_syntax, &input, &output),
        Commands::Encode { transfer_syntax, input, output, width, height, components, bits_per_sample } => {
            encode(&transfer_syntax, &input, &output, width, height, components, bits_per_sample)
        }
        Commands::BuildInfo => build_info(),
        Commands::ListCodecs => list_codecs(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn decode(transfer_syntax: &str, input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let registry = medcodec_native::codec_registry();
    let codec = registry.lookup(transfer_syntax).ok_or_else(|| format!("no codec registered for {transfer_syntax}"))?;
    let data = fs::read(input)?;
    let frame = codec.decode(&data)?;
    fs::write(output, &frame.data)?;
    println!(
        "decoded {}x{} ({} components, {} bps) via {}",
        frame.width, frame.height, frame.components, frame.bits_per_sample, codec.name()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encode(
    transfer_syntax: &str,
    input: &PathBuf,
    output: &PathBuf,
    width: u32,
    height: u32,
    components: u16,
    bits_per_sample: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = medcodec_native::codec_registry();
    let codec = registry.lookup(transfer_syntax).ok_or_else(|| format!("no codec registered for {transfer_syntax}"))?;
    let data = fs::read(input)?;
    let frame = medcodec_native::RasterFrame { width, height, components, bits_per_sample, signed: false, data };
    let encoded = codec.encode(&frame)?;
    fs::write(output, &encoded)?;
    println!("encoded {width}x{height} via {} ({} bytes)", codec.name(), encoded.len());
    Ok(())
}

fn build_info() -> Result<(), Box<dyn std::error::Error>> {
    // SAFETY: these entry points take no pointer arguments and never fail.
    let (version, features, simd) = unsafe { (facade::version(), facade::features(), facade::simd_features()) };
    println!("ABI version:    {version}");
    println!("feature mask:   0x{features:02x}");
    println!("SIMD mask:      0x{simd:02x}");
    println!("GPU available:  {}", facade::gpu::is_available());
    Ok(())
}

fn list_codecs() -> Result<(), Box<dyn std::error::Error>> {
    let registry = medcodec_native::codec_registry();
    for ts in [
        "1.2.840.10008.1.2.4.50",
        "1.2.840.10008.1.2.4.80",
        "1.2.840.10008.1.2.4.81",
        "1.2.840.10008.1.2.4.90",
        "1.2.840.10008.1.2.4.91",
    ] {
        match registry.get_codec_info(ts) {
            Some(entry) => println!("{ts:30} -> {} (priority {})", entry.codec.name(), entry.priority),
            None => println!("{ts:30} -> (unregistered)"),
        }
    }
    Ok(())
}

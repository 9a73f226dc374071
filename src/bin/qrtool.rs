use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use qrscan::encoder::{EncodeSegment, encode_segments};
use qrscan::models::{ECLevel, Version};
use qrscan::status::StatusReport;
use qrscan::tools::{decode_base64_status, decode_file_status, save_symbol};
use qrscan::{DecoderConfig, Preprocess, QrReader};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "qrscan CLI tools")]
struct Cli {
    /// Run preprocessing passes concurrently
    #[arg(long, global = true)]
    parallel: bool,
    /// Only decode the image as given, without resampled passes
    #[arg(long, global = true)]
    no_upscale: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one image and print the status JSON
    Decode(DecodeArgs),
    /// Render text as a QR symbol image
    Encode {
        #[arg(long)]
        text: String,
        #[arg(long)]
        out: PathBuf,
        /// Error correction level: L, M, Q or H
        #[arg(long, default_value = "M", value_parser = parse_ec_level)]
        level: ECLevel,
        /// Fixed version (1-40); smallest fitting version when absent
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=40))]
        version: Option<u8>,
        /// Pixels per module
        #[arg(long, default_value_t = 8)]
        scale: usize,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DecodeArgs {
    /// Image file (PNG, JPEG, GIF, BMP, ...)
    #[arg(long)]
    image: Option<PathBuf>,
    /// Text file holding base64 image data, optionally a data URL
    #[arg(long)]
    base64: Option<PathBuf>,
}

fn parse_ec_level(value: &str) -> Result<ECLevel, String> {
    match value.to_ascii_uppercase().as_str() {
        "L" => Ok(ECLevel::L),
        "M" => Ok(ECLevel::M),
        "Q" => Ok(ECLevel::Q),
        "H" => Ok(ECLevel::H),
        other => Err(format!("unknown error correction level {other:?}")),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Decode(args) => {
            let reader = QrReader::new(reader_config(cli.parallel, cli.no_upscale));
            let report = decode_cmd(&reader, args);
            println!("{}", report.to_json());
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Encode {
            text,
            out,
            level,
            version,
            scale,
        } => match encode_cmd(&text, &out, level, version, scale) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Failed to encode {text:?}: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn reader_config(parallel: bool, no_upscale: bool) -> DecoderConfig {
    let mut config = DecoderConfig::from_env();
    if parallel {
        config = config.with_parallel_passes(true);
    }
    if no_upscale {
        config = config.with_passes(vec![Preprocess::Original]);
    }
    debug!(
        "passes: {}",
        config
            .passes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );
    config
}

fn decode_cmd(reader: &QrReader, args: DecodeArgs) -> StatusReport {
    match (args.image, args.base64) {
        (Some(image), _) => decode_file_status(reader, image),
        (None, Some(path)) => match fs::read_to_string(&path) {
            Ok(text) => decode_base64_status(reader, &text),
            Err(err) => StatusReport::from(qrscan::DecodeError::from(err)),
        },
        (None, None) => StatusReport::from(qrscan::DecodeError::MissingInput),
    }
}

fn encode_cmd(
    text: &str,
    out: &Path,
    level: ECLevel,
    version: Option<u8>,
    scale: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let version = version.and_then(Version::new);
    let symbol = encode_segments(&[EncodeSegment::auto(text)], level, version, None)?;
    save_symbol(&symbol, scale, out)?;
    info!(
        "wrote version {} symbol ({} modules) to {}",
        symbol.version.number(),
        symbol.dimension(),
        out.display()
    );
    Ok(())
}

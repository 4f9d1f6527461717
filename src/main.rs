use clap::{Parser, Subcommand};
use owlvision::alloc::SystemAllocator;
use owlvision::plane::Image;
use owlvision::{container, error, yuv_io, Result};
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "owlvision", about = "Encode/decode still images with the OwlVision codec")]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Tile side used by the DCT/quantization stage (4, 8, 16, or 32)
  #[arg(long, default_value_t = 8, global = true)]
  tile: usize,
}

#[derive(Subcommand)]
enum Command {
  /// Encode a raw YUV420p file into an OVC container
  Encode {
    input: String,
    output: String,
    width: usize,
    height: usize,
  },
  /// Decode an OVC container into a raw YUV420p file
  Decode { input: String, output: String },
}

fn run(cli: Cli) -> Result<()> {
  let alloc = SystemAllocator;
  match cli.command {
    Command::Encode { input, output, width, height } => {
      let mut reader = yuv_io::YuvReader::new(File::open(&input)?, width, height);
      let image = reader
        .read_frame(&alloc)?
        .ok_or_else(|| error::OwlVisionError::InvalidFormat(format!("{input} has no frame data")))?;

      let mut out = BufWriter::new(File::create(&output)?);
      container::write(&image, cli.tile, &mut out)?;
      log::info!("encoded {}x{} -> {}", width, height, output);
    }
    Command::Decode { input, output } => {
      let mut source = File::open(&input)?;
      let image: Image = container::read(&mut source, cli.tile, &alloc)?;

      let mut writer = yuv_io::YuvWriter::new(BufWriter::new(File::create(&output)?), image.width, image.height);
      writer.write_frame(&image)?;
      log::info!("decoded {} -> {}x{}", input, image.width, image.height);
    }
  }
  Ok(())
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{e}");
      ExitCode::FAILURE
    }
  }
}

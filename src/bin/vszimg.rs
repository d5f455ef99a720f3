use std::{
  fs::{self, File},
  io::{self, BufReader, Read, Write},
  path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use vszimg::{png::PngChunkReader, EmbedOptions, ImageFormat};

#[derive(Parser)]
#[command(name = "vszimg", about = "Keep a Veusz document inside of a PNG or SVG image")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Store a saved document in an image, replacing the image file.
  ///
  /// An SVG's old document is replaced. A PNG keeps its old document chunk,
  /// and since the new one goes in ahead of it (at index 1), `extract` still
  /// gives the old document. Embed into a freshly exported PNG instead.
  Embed {
    /// The .png or .svg file to write into.
    image: PathBuf,
    /// The saved document, or `-` for stdin.
    script: PathBuf,
    /// Where the new PNG chunk goes in the chunk list.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    index: isize,
    /// Accept PNG chunks with bad checksums (they're rewritten correctly).
    #[arg(long)]
    lenient: bool,
  },
  /// Print the document stored in an image.
  Extract {
    image: PathBuf,
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// List the chunks of a PNG file.
  Chunks {
    image: PathBuf,
    #[arg(long)]
    lenient: bool,
  },
  /// Print the commands of the document stored in an image, one per line.
  Commands { image: PathBuf },
}

fn main() -> Result<()> {
  match Cli::parse().command {
    Command::Embed { image, script, index, lenient } => {
      let script = if script.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
        text
      } else {
        fs::read_to_string(&script)
          .with_context(|| format!("failed to read document: {}", script.display()))?
      };
      let options = EmbedOptions { index, lenient };
      vszimg::embed_with(&image, &script, &options)
        .with_context(|| format!("failed to embed into {}", image.display()))?;
    }
    Command::Extract { image, output } => {
      let script = extract_or_bail(&image)?;
      match output {
        Some(path) => fs::write(&path, script)
          .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().write_all(script.as_bytes())?,
      }
    }
    Command::Chunks { image, lenient } => {
      if ImageFormat::from_path(&image)? != ImageFormat::Png {
        bail!("not a png file: {}", image.display());
      }
      let file =
        File::open(&image).with_context(|| format!("failed to open {}", image.display()))?;
      for (n, chunk) in PngChunkReader::new(BufReader::new(file)).lenient(lenient).enumerate() {
        let chunk = chunk.with_context(|| format!("bad chunk after {n} good ones"))?;
        let script = if vszimg::png::text::chunk_script(&chunk).is_some() { " (script)" } else { "" };
        println!("{n}: {} {} bytes{script}", chunk.ty(), chunk.data().len());
      }
    }
    Command::Commands { image } => {
      let script = extract_or_bail(&image)?;
      for command in vszimg::parse_script(&script)? {
        println!("{:>4}: {command}", command.line);
      }
    }
  }
  Ok(())
}

fn extract_or_bail(image: &Path) -> Result<String> {
  match vszimg::extract(image).with_context(|| format!("failed to read {}", image.display()))? {
    Some(script) => Ok(script),
    None => bail!("no document stored in {}", image.display()),
  }
}

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use arith_coder::{compress, decompress, CodecStats};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "arith")]
#[command(about = "Static-model arithmetic coder for byte streams")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    Compress {
        /// Input file path
        input: PathBuf,
        /// Output file path
        output: PathBuf,
    },
    /// Decompress a file
    Decompress {
        /// Input file path
        input: PathBuf,
        /// Output file path
        output: PathBuf,
    },
    /// Compress, decompress and verify each input
    Roundtrip {
        /// Directory for the .arith and .dearith files (defaults to each input's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Input file paths
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn compress_file(input: &Path, output: &Path) -> Result<CodecStats> {
    let reader = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let writer =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    compress(BufReader::new(reader), BufWriter::new(writer))
        .with_context(|| format!("compressing {}", input.display()))
}

fn decompress_file(input: &Path, output: &Path) -> Result<CodecStats> {
    let reader = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let writer =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    decompress(reader, BufWriter::new(writer))
        .with_context(|| format!("decompressing {}", input.display()))
}

/// Byte-for-byte comparison of two files.
fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    let mut left = BufReader::new(File::open(a).with_context(|| format!("opening {}", a.display()))?);
    let mut right =
        BufReader::new(File::open(b).with_context(|| format!("opening {}", b.display()))?);
    let mut lbuf = [0u8; 8192];
    let mut rbuf = [0u8; 8192];
    loop {
        let n = read_full(&mut left, &mut lbuf)?;
        let m = read_full(&mut right, &mut rbuf)?;
        if n != m || lbuf[..n] != rbuf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// `<out_dir or input dir>/<input file name>.<extension>`; the full name is
/// kept so `a.txt` and `a.md` never share outputs.
fn sibling(input: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let mut name = input
        .file_name()
        .unwrap_or(input.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(extension);
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(name)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Output paths for one round trip. Fails if either would clobber one of the
/// inputs of this run.
fn output_paths(
    input: &Path,
    out_dir: Option<&Path>,
    inputs: &[PathBuf],
) -> Result<(PathBuf, PathBuf)> {
    let packed = sibling(input, out_dir, "arith");
    let unpacked = sibling(input, out_dir, "dearith");
    for output in [&packed, &unpacked] {
        if let Some(clash) = inputs.iter().find(|other| same_path(output, other)) {
            bail!(
                "output {} for {} would overwrite input {}",
                output.display(),
                input.display(),
                clash.display()
            );
        }
    }
    Ok((packed, unpacked))
}

fn roundtrip(input: &Path, out_dir: Option<&Path>, inputs: &[PathBuf]) -> Result<bool> {
    let (packed, unpacked) = output_paths(input, out_dir, inputs)?;

    let start = Instant::now();
    let stats = compress_file(input, &packed)?;
    let ratio = if stats.input_bytes == 0 {
        0.0
    } else {
        stats.output_bytes as f64 / stats.input_bytes as f64 * 100.0
    };
    info!(
        input = %input.display(),
        output = %packed.display(),
        original_bytes = stats.input_bytes,
        compressed_bytes = stats.output_bytes,
        ratio_percent = ratio,
        duration_secs = start.elapsed().as_secs_f64(),
        "compression complete"
    );

    let start = Instant::now();
    decompress_file(&packed, &unpacked)?;
    info!(
        input = %packed.display(),
        output = %unpacked.display(),
        duration_secs = start.elapsed().as_secs_f64(),
        "decompression complete"
    );

    let identical = same_contents(input, &unpacked)?;
    if identical {
        println!("{}: ok ({} -> {} bytes)", input.display(), stats.input_bytes, stats.output_bytes);
    } else {
        error!(input = %input.display(), output = %unpacked.display(), "round trip mismatch");
        println!("{}: MISMATCH", input.display());
    }
    Ok(identical)
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Compress { input, output } => {
            let stats = compress_file(&input, &output)?;
            info!(
                original_bytes = stats.input_bytes,
                compressed_bytes = stats.output_bytes,
                "compression complete"
            );
            Ok(true)
        }
        Commands::Decompress { input, output } => {
            let stats = decompress_file(&input, &output)?;
            info!(
                compressed_bytes = stats.input_bytes,
                original_bytes = stats.output_bytes,
                "decompression complete"
            );
            Ok(true)
        }
        Commands::Roundtrip { out_dir, inputs } => {
            let mut all_ok = true;
            for input in &inputs {
                match roundtrip(input, out_dir.as_deref(), &inputs) {
                    Ok(ok) => all_ok &= ok,
                    Err(e) => {
                        error!(input = %input.display(), "{e:#}");
                        all_ok = false;
                    }
                }
            }
            if inputs.len() > 1 && !all_ok {
                warn!(files = inputs.len(), "some round trips failed");
            }
            Ok(all_ok)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Batch download product images listed in a CSV file.
///
/// Reads a `;`-delimited file with `sku` and `image_url` columns, saves each
/// image as `<sku>_<n><ext>` and writes failed rows to an error log.
#[derive(Parser, Debug)]
#[command(name = "sku-images")]
#[command(author, version, about)]
pub struct Args {
    /// Semicolon-delimited input with `sku` and `image_url` columns
    pub input: PathBuf,

    /// Batch name; images go to ./images/<BATCH>/ (default: input file stem)
    #[arg(short, long)]
    pub batch: Option<String>,

    /// Output directory (overrides --batch); must already exist
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Where to write failed rows [default: error_log.csv]
    #[arg(short, long)]
    pub error_log: Option<PathBuf>,

    /// Rows admitted per batch (1-100) [default: 1]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Fixed delay before each download in milliseconds (max 60000) [default: 0]
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

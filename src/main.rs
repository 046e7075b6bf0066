//! Coinbase Pool Tagger CLI
//!
//! Merges the coinbase transaction CSVs in the input directory, attributes
//! each transaction to a mining pool and writes XLSX and CSV outputs.
//!
//! Usage:
//!   pool-tagger
//!   pool-tagger --input-dir ./YearlyCoinbaseTransactions --output-dir ./Export
//!   RUST_LOG=debug pool-tagger --tags ./coinbase_tags_clean.json

use anyhow::{bail, Context, Result};
use clap::Parser;
use coinbase_pool_tagger::config::{
    expand_path, DEFAULT_INPUT_DIR, DEFAULT_INPUT_EXTENSION, DEFAULT_OUTPUT_DIR,
    DEFAULT_OUTPUT_STEM, DEFAULT_TAGS_PATH,
};
use coinbase_pool_tagger::{run, PipelineConfig, SanitizeMode};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pool-tagger", version, about = "Attribute coinbase transactions to mining pools")]
struct Args {
    /// Directory containing the coinbase transaction CSV files
    #[arg(short, long, env = "POOL_TAGGER_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: String,

    /// JSON file with the coinbase_tags dictionary
    #[arg(short, long, env = "POOL_TAGGER_TAGS", default_value = DEFAULT_TAGS_PATH)]
    tags: String,

    /// Directory for the XLSX and CSV outputs (created if missing)
    #[arg(short, long, env = "POOL_TAGGER_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: String,

    /// Output file name without extension
    #[arg(long, env = "POOL_TAGGER_OUTPUT_STEM", default_value = DEFAULT_OUTPUT_STEM)]
    output_stem: String,

    /// Extension of the input files to read
    #[arg(long, default_value = DEFAULT_INPUT_EXTENSION)]
    extension: String,

    /// Field delimiter for input and output text files
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Keep only printable ASCII in exported cells
    #[arg(long)]
    ascii_only: bool,

    /// Stop ingesting after this many records
    #[arg(long, env = "POOL_TAGGER_MAX_RECORDS")]
    max_records: Option<usize>,

    /// Log per-record match results
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }

        Ok(PipelineConfig {
            input_dir: expand_path(&self.input_dir),
            tags_path: expand_path(&self.tags),
            output_dir: expand_path(&self.output_dir),
            output_stem: self.output_stem,
            input_extension: self.extension,
            delimiter: self.delimiter as u8,
            sanitize_mode: if self.ascii_only {
                SanitizeMode::PrintableAscii
            } else {
                SanitizeMode::Spreadsheet
            },
            max_records: self.max_records,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = args.into_config()?;
    info!("Input: {}", config.input_dir.display());
    info!("Tags: {}", config.tags_path.display());
    info!("Output: {}", config.output_dir.display());

    let summary = run(&config).context("Pipeline aborted")?;

    info!(
        "Done: {} records from {} files ({} skipped), {} matched, {} decode failures",
        summary.records,
        summary.files_read,
        summary.files_skipped,
        summary.matched,
        summary.decode_failures
    );
    if !summary.warnings.is_empty() {
        warn!("{} ingestion warnings, see above", summary.warnings.len());
    }

    if summary.export.all_failed() {
        error!("No output could be written");
        bail!("Export failed for every output format");
    }
    Ok(())
}

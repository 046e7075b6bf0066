//! Run Configuration
//!
//! Input, dictionary and output locations plus the few knobs the pipeline
//! exposes. The defaults reproduce the fixed layout the tool has always used,
//! so a bare run needs no arguments.

use std::path::PathBuf;

use crate::sanitize::SanitizeMode;

/// Directory holding the yearly coinbase transaction exports
pub const DEFAULT_INPUT_DIR: &str = "./YearlyCoinbaseTransactions";

/// JSON file with the `coinbase_tags` dictionary
pub const DEFAULT_TAGS_PATH: &str = "./coinbase_tags_clean.json";

/// Directory the XLSX and CSV outputs are written to
pub const DEFAULT_OUTPUT_DIR: &str = "./Export";

/// File name (without extension) shared by both outputs
pub const DEFAULT_OUTPUT_STEM: &str = "allcoinbase_final";

/// Extension of the input files to ingest
pub const DEFAULT_INPUT_EXTENSION: &str = "csv";

/// Field delimiter for input and output text files
pub const DEFAULT_DELIMITER: u8 = b',';

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory scanned for input files
    pub input_dir: PathBuf,
    /// Tag dictionary file
    pub tags_path: PathBuf,
    /// Output directory, created if missing
    pub output_dir: PathBuf,
    /// Output file name without extension
    pub output_stem: String,
    /// Input file extension, matched case-insensitively
    pub input_extension: String,
    /// Delimiter for the input files and the delimited output
    pub delimiter: u8,
    /// Character set kept by the sanitizer
    pub sanitize_mode: SanitizeMode,
    /// Stop ingesting after this many records
    pub max_records: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            tags_path: PathBuf::from(DEFAULT_TAGS_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_stem: DEFAULT_OUTPUT_STEM.to_string(),
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            delimiter: DEFAULT_DELIMITER,
            sanitize_mode: SanitizeMode::default(),
            max_records: None,
        }
    }
}

impl PipelineConfig {
    /// Create a config with the three locations set and defaults elsewhere.
    /// `~/` prefixes are expanded.
    pub fn with_paths(input_dir: &str, tags_path: &str, output_dir: &str) -> Self {
        Self {
            input_dir: expand_path(input_dir),
            tags_path: expand_path(tags_path),
            output_dir: expand_path(output_dir),
            ..Default::default()
        }
    }

    /// Path of the spreadsheet output
    pub fn xlsx_path(&self) -> PathBuf {
        self.output_path("xlsx")
    }

    /// Path of the delimited text output
    pub fn csv_path(&self) -> PathBuf {
        self.output_path("csv")
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_stem, extension))
    }
}

/// Expand ~ to home directory in path
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

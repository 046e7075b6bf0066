//! Coinbase CSV Ingestion
//!
//! Reads every input CSV in a directory, in file-name order, and concatenates
//! their rows into one record set. A file missing any required column
//! contributes nothing; the rest of the run continues.

use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::record::{RecordSet, TransactionRecord};

pub const INPUT_SCRIPT_COLUMN: &str = "Input script";
pub const TX_HASH_COLUMN: &str = "TX hash";
pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const DATE_COLUMN: &str = "Date";

/// Columns every input file must carry (case-sensitive)
pub const REQUIRED_COLUMNS: [&str; 4] = [
    INPUT_SCRIPT_COLUMN,
    TX_HASH_COLUMN,
    TIMESTAMP_COLUMN,
    DATE_COLUMN,
];

/// Fatal ingestion errors
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to list input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recoverable ingestion problems, each naming the offending input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestWarning {
    #[error("{file}: missing required column {column:?}, skipping file")]
    MissingColumn { file: String, column: String },

    #[error("{file}: unreadable, skipping file: {reason}")]
    UnreadableFile { file: String, reason: String },

    #[error("{file}:{line}: malformed row skipped: {reason}")]
    MalformedRow { file: String, line: u64, reason: String },

    #[error("Record limit of {limit} reached, remaining input ignored")]
    RecordLimitReached { limit: usize },
}

impl IngestWarning {
    /// File the warning refers to, if any
    pub fn file(&self) -> Option<&str> {
        match self {
            IngestWarning::MissingColumn { file, .. }
            | IngestWarning::UnreadableFile { file, .. }
            | IngestWarning::MalformedRow { file, .. } => Some(file),
            IngestWarning::RecordLimitReached { .. } => None,
        }
    }
}

/// Result of ingesting a directory
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Concatenated records, file order then row order
    pub records: RecordSet,
    /// Files that contributed rows (or were empty but well-formed)
    pub files_read: usize,
    /// Files skipped entirely
    pub files_skipped: usize,
    /// Every recoverable problem encountered
    pub warnings: Vec<IngestWarning>,
}

/// Column positions of the required fields in one file
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    input_script: usize,
    tx_hash: usize,
    timestamp: usize,
    date: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, &'static str> {
        let find = |name: &'static str| headers.iter().position(|h| h == name).ok_or(name);
        Ok(Self {
            input_script: find(INPUT_SCRIPT_COLUMN)?,
            tx_hash: find(TX_HASH_COLUMN)?,
            timestamp: find(TIMESTAMP_COLUMN)?,
            date: find(DATE_COLUMN)?,
        })
    }

    fn build(&self, row: &StringRecord) -> TransactionRecord {
        let field = |i: usize| row.get(i).unwrap_or("");
        TransactionRecord::new(
            field(self.input_script),
            field(self.tx_hash),
            field(self.timestamp),
            field(self.date),
        )
    }
}

/// Directory-to-records reader
#[derive(Debug, Clone)]
pub struct Ingestor {
    extension: String,
    delimiter: u8,
    max_records: Option<usize>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Ingestor {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            extension: config.input_extension.clone(),
            delimiter: config.delimiter,
            max_records: config.max_records,
        }
    }

    /// Cap the total number of records ingested
    pub fn with_max_records(mut self, limit: usize) -> Self {
        self.max_records = Some(limit);
        self
    }

    fn is_input_file(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(&self.extension))
                .unwrap_or(false)
    }

    /// List input files in `dir`, sorted by file name
    pub fn list_input_files(&self, dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        if !dir.is_dir() {
            return Err(IngestError::DirectoryNotFound(dir.to_path_buf()));
        }
        let read_dir_err = |source| IngestError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if self.is_input_file(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Ingest every input file in `dir`
    pub fn ingest_dir(&self, dir: &Path) -> Result<IngestReport, IngestError> {
        let files = self.list_input_files(dir)?;
        let mut report = IngestReport::default();

        for path in &files {
            let remaining = self
                .max_records
                .map(|limit| limit.saturating_sub(report.records.len()));

            info!("Reading file: {}", path.display());
            match self.read_file_capped(path, remaining, &mut report.warnings) {
                Ok((records, truncated)) => {
                    report.files_read += 1;
                    report.records.extend(records);
                    if truncated {
                        report.warnings.push(self.limit_reached());
                        break;
                    }
                }
                Err(warning) => {
                    warn!("{}", warning);
                    report.files_skipped += 1;
                    report.warnings.push(warning);
                }
            }
        }

        info!(
            "Merged {} files into {} records ({} skipped)",
            report.files_read,
            report.records.len(),
            report.files_skipped
        );
        Ok(report)
    }

    fn limit_reached(&self) -> IngestWarning {
        let warning = IngestWarning::RecordLimitReached {
            limit: self.max_records.unwrap_or_default(),
        };
        warn!("{}", warning);
        warning
    }

    /// Read one file.
    ///
    /// Returns `Err` when the whole file must be skipped. Malformed rows are
    /// skipped individually and reported through `warnings`, as is hitting the
    /// record limit.
    pub fn read_file(
        &self,
        path: &Path,
        warnings: &mut Vec<IngestWarning>,
    ) -> Result<RecordSet, IngestWarning> {
        let (records, truncated) = self.read_file_capped(path, self.max_records, warnings)?;
        if truncated {
            warnings.push(self.limit_reached());
        }
        Ok(records)
    }

    /// Read at most `capacity` records from one file. The flag is set when a
    /// row past the capacity was left unread.
    fn read_file_capped(
        &self,
        path: &Path,
        capacity: Option<usize>,
        warnings: &mut Vec<IngestWarning>,
    ) -> Result<(RecordSet, bool), IngestWarning> {
        let file_name = display_name(path);
        let unreadable = |e: csv::Error| IngestWarning::UnreadableFile {
            file: file_name.clone(),
            reason: e.to_string(),
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(unreadable)?;

        let headers = reader.headers().map_err(unreadable)?.clone();
        let columns = ColumnIndex::from_headers(&headers).map_err(|column| {
            IngestWarning::MissingColumn {
                file: file_name.clone(),
                column: column.to_string(),
            }
        })?;

        let mut records = Vec::new();
        let mut truncated = false;
        for (idx, result) in reader.records().enumerate() {
            if capacity.is_some_and(|c| records.len() >= c) {
                truncated = true;
                break;
            }
            // Header is line 1
            let fallback_line = idx as u64 + 2;
            match result {
                Ok(row) => {
                    let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);
                    records.push(columns.build(&row).with_source(file_name.as_str(), line));
                }
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                    let warning = IngestWarning::MalformedRow {
                        file: file_name.clone(),
                        line,
                        reason: e.to_string(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok((records, truncated))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

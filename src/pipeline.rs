//! Pipeline Driver
//!
//! Runs the stages in order over one in-memory record set:
//! load tags, ingest, decode, match, sanitize, export.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::decoder::decode_script;
use crate::export::{ExportReport, Exporter};
use crate::ingest::{IngestError, IngestWarning, Ingestor};
use crate::matcher::{match_record, pool_counts};
use crate::record::TransactionRecord;
use crate::sanitize::{sanitize_record, SanitizeMode};
use crate::tags::{ConfigError, TagDictionary};

/// Fatal pipeline errors, naming the stage that failed
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Loading coinbase tags failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingesting input files failed: {0}")]
    Ingest(#[from] IngestError),
}

/// What a run did
#[derive(Debug)]
pub struct RunSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub records: usize,
    pub decode_failures: usize,
    pub matched: usize,
    /// Match counts per pool, dictionary order
    pub pool_counts: Vec<(String, usize)>,
    pub warnings: Vec<IngestWarning>,
    pub export: ExportReport,
}

/// Counts from processing a record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub decode_failures: usize,
    pub matched: usize,
}

/// Decode every record's input script. Failures are logged and kept on the
/// record; they never stop the batch.
pub fn decode_records(records: &mut [TransactionRecord]) -> usize {
    let mut failures = 0;
    for record in records.iter_mut() {
        let result = decode_script(&record.input_script);
        if let Err(e) = &result {
            warn!(tx_hash = %record.tx_hash, "{}: could not decode input script: {}", record.location(), e);
            failures += 1;
        }
        record.apply_decoded(result);
    }
    failures
}

/// Attach pool attribution to every record, returning how many matched
pub fn match_records(records: &mut [TransactionRecord], dictionary: &TagDictionary) -> usize {
    records
        .iter_mut()
        .filter_map(|record| match_record(record, dictionary))
        .count()
}

/// Decode, match and sanitize a record set in place
pub fn process_records(
    records: &mut [TransactionRecord],
    dictionary: &TagDictionary,
    mode: SanitizeMode,
) -> ProcessStats {
    let decode_failures = decode_records(records);
    info!(
        "Decoded {} input scripts ({} failed)",
        records.len(),
        decode_failures
    );

    let matched = match_records(records, dictionary);
    info!("Matched {} of {} records to a mining pool", matched, records.len());

    for record in records.iter_mut() {
        sanitize_record(record, mode);
    }

    ProcessStats {
        decode_failures,
        matched,
    }
}

/// Run the whole pipeline
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let dictionary = TagDictionary::load(&config.tags_path)?;

    let ingest = Ingestor::from_config(config).ingest_dir(&config.input_dir)?;
    let mut records = ingest.records;

    let stats = process_records(&mut records, &dictionary, config.sanitize_mode);
    let pool_counts = pool_counts(&records, &dictionary);
    for (pool, count) in &pool_counts {
        info!("  {}: {}", pool, count);
    }

    let export = Exporter::from_config(config).export(&records);

    Ok(RunSummary {
        files_read: ingest.files_read,
        files_skipped: ingest.files_skipped,
        records: records.len(),
        decode_failures: stats.decode_failures,
        matched: stats.matched,
        pool_counts,
        warnings: ingest.warnings,
        export,
    })
}

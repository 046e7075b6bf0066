//! Coinbase Pool Tagger Library
//!
//! This crate merges exported coinbase transaction CSV files, decodes the
//! miner-supplied input scripts, attributes each transaction to a mining pool
//! via a tag dictionary, and writes the result as XLSX and CSV.

pub mod config;
pub mod decoder;
pub mod export;
pub mod ingest;
pub mod matcher;
pub mod pipeline;
pub mod record;
pub mod sanitize;
pub mod tags;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use decoder::{decode_script, DecodeError, DecodedScript};
pub use export::{ExportError, ExportReport, ExportRow, Exporter};
pub use ingest::{IngestError, IngestReport, IngestWarning, Ingestor};
pub use matcher::{match_pool, match_record};
pub use pipeline::{run, PipelineError, RunSummary};
pub use record::{RecordSet, TransactionRecord};
pub use sanitize::{sanitize, SanitizeMode};
pub use tags::{ConfigError, TagDictionary, TagEntry};

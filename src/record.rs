//! Transaction records
//!
//! One `TransactionRecord` per input CSV row. The source columns are copied
//! verbatim at ingestion; the derived columns are filled in by the decoder and
//! the matcher as the record moves through the pipeline.

use crate::decoder::{DecodeError, DecodedScript};
use crate::tags::TagEntry;

/// Ordered set of records: file order first, then row order within each file
pub type RecordSet = Vec<TransactionRecord>;

/// A single coinbase transaction row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    /// Name of the CSV file the row came from
    pub source_file: String,
    /// 1-based line number of the row inside `source_file`
    pub line: u64,
    /// Hex-encoded coinbase input script (`Input script` column)
    pub input_script: String,
    /// `TX hash` column
    pub tx_hash: String,
    /// `Timestamp` column
    pub timestamp: String,
    /// `Date` column
    pub date: String,
    /// Script bytes interpreted as UTF-8 (ASCII fallback when invalid)
    pub decoded_utf8: String,
    /// Script bytes with non-printable bytes replaced by `.`
    pub decoded_ascii: String,
    /// Canonical lowercase hex of the script bytes
    pub decoded_hex: String,
    /// Matched pool name, if any tag matched
    pub pool_name: Option<String>,
    /// Matched pool link, if any tag matched
    pub pool_link: Option<String>,
    /// Why decoding failed, when it did
    pub decode_error: Option<DecodeError>,
}

impl TransactionRecord {
    /// Create a record from the four source columns
    pub fn new(
        input_script: impl Into<String>,
        tx_hash: impl Into<String>,
        timestamp: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            input_script: input_script.into(),
            tx_hash: tx_hash.into(),
            timestamp: timestamp.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    /// Attach the file name and line the row was read from
    pub fn with_source(mut self, source_file: impl Into<String>, line: u64) -> Self {
        self.source_file = source_file.into();
        self.line = line;
        self
    }

    /// Human-readable location used in log messages (`file:line`)
    pub fn location(&self) -> String {
        format!("{}:{}", self.source_file, self.line)
    }

    /// Store the outcome of decoding the input script.
    ///
    /// On failure all three derived fields are left empty and the error kind
    /// is kept on the record.
    pub fn apply_decoded(&mut self, result: Result<DecodedScript, DecodeError>) {
        match result {
            Ok(decoded) => {
                self.decoded_utf8 = decoded.utf8;
                self.decoded_ascii = decoded.ascii;
                self.decoded_hex = decoded.hex;
                self.decode_error = None;
            }
            Err(e) => {
                self.decoded_utf8.clear();
                self.decoded_ascii.clear();
                self.decoded_hex.clear();
                self.decode_error = Some(e);
            }
        }
    }

    /// Set the pool attribution from a matched dictionary entry
    pub fn apply_pool(&mut self, entry: &TagEntry) {
        self.pool_name = Some(entry.name.clone());
        self.pool_link = Some(entry.link.clone());
    }

    /// Text the matcher scans: UTF-8 decoding, or ASCII when that is empty
    pub fn match_text(&self) -> &str {
        if self.decoded_utf8.is_empty() {
            &self.decoded_ascii
        } else {
            &self.decoded_utf8
        }
    }

    pub fn is_matched(&self) -> bool {
        self.pool_name.is_some()
    }

    pub fn is_decode_failure(&self) -> bool {
        self.decode_error.is_some()
    }
}

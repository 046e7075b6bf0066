//! XLSX and CSV Export
//!
//! Writes the processed record set as a spreadsheet and as delimited text.
//! Both files are produced from the same in-memory rows in one pass, so they
//! always agree on row order and cell values. A failure writing one format
//! does not stop the other.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::record::TransactionRecord;

/// Output header, in column order
pub const EXPORT_HEADERS: [&str; 5] = [
    "Mining Pool Name",
    "Mining Pool Link",
    "TX hash",
    "Timestamp",
    "Date",
];

/// Worksheet name used in the spreadsheet output
pub const SHEET_NAME: &str = "Coinbase";

/// Errors that can occur while writing one output format
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush CSV {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write spreadsheet {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub pool_name: String,
    pub pool_link: String,
    pub tx_hash: String,
    pub timestamp: String,
    pub date: String,
}

impl ExportRow {
    /// Project a processed record onto the output columns.
    /// Unmatched records get empty pool cells.
    pub fn from_record(record: &TransactionRecord) -> Self {
        ExportRow {
            pool_name: record.pool_name.clone().unwrap_or_default(),
            pool_link: record.pool_link.clone().unwrap_or_default(),
            tx_hash: record.tx_hash.clone(),
            timestamp: record.timestamp.clone(),
            date: record.date.clone(),
        }
    }

    /// Cell values in `EXPORT_HEADERS` order
    pub fn cells(&self) -> [&str; 5] {
        [
            self.pool_name.as_str(),
            self.pool_link.as_str(),
            self.tx_hash.as_str(),
            self.timestamp.as_str(),
            self.date.as_str(),
        ]
    }
}

/// Outcome of an export, one result per format
#[derive(Debug)]
pub struct ExportReport {
    /// Data rows written to each format (header excluded)
    pub rows: usize,
    pub xlsx: Result<PathBuf, ExportError>,
    pub csv: Result<PathBuf, ExportError>,
}

impl ExportReport {
    pub fn all_failed(&self) -> bool {
        self.xlsx.is_err() && self.csv.is_err()
    }

    pub fn any_failed(&self) -> bool {
        self.xlsx.is_err() || self.csv.is_err()
    }
}

/// Writer for both output formats
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    xlsx_path: PathBuf,
    csv_path: PathBuf,
    delimiter: u8,
}

impl Exporter {
    /// Create an exporter writing `<stem>.xlsx` and `<stem>.csv` into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, stem: &str) -> Self {
        let output_dir = output_dir.into();
        Self {
            xlsx_path: output_dir.join(format!("{}.xlsx", stem)),
            csv_path: output_dir.join(format!("{}.csv", stem)),
            output_dir,
            delimiter: b',',
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            xlsx_path: config.xlsx_path(),
            csv_path: config.csv_path(),
            delimiter: config.delimiter,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn xlsx_path(&self) -> &Path {
        &self.xlsx_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Write both formats from the same rows
    pub fn export(&self, records: &[TransactionRecord]) -> ExportReport {
        let rows: Vec<ExportRow> = records.iter().map(ExportRow::from_record).collect();

        let xlsx = self.write_xlsx(&rows);
        match &xlsx {
            Ok(path) => info!("Processed data saved to {}", path.display()),
            Err(e) => error!("{}", e),
        }

        let csv = self.write_csv(&rows);
        match &csv {
            Ok(path) => info!("Processed data saved to {}", path.display()),
            Err(e) => error!("{}", e),
        }

        ExportReport {
            rows: rows.len(),
            xlsx,
            csv,
        }
    }

    fn ensure_output_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Write the delimited text output
    pub fn write_csv(&self, rows: &[ExportRow]) -> Result<PathBuf, ExportError> {
        self.ensure_output_dir()?;
        let path = &self.csv_path;
        let csv_err = |source| ExportError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_path(path)
            .map_err(csv_err)?;

        writer.write_record(EXPORT_HEADERS).map_err(csv_err)?;
        for row in rows {
            writer.write_record(row.cells()).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| ExportError::Flush {
            path: path.clone(),
            source,
        })?;

        Ok(path.clone())
    }

    /// Write the spreadsheet output
    pub fn write_xlsx(&self, rows: &[ExportRow]) -> Result<PathBuf, ExportError> {
        self.ensure_output_dir()?;
        let path = &self.xlsx_path;
        let xlsx_err = |source| ExportError::Xlsx {
            path: path.clone(),
            source,
        };

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

        for (col, header) in EXPORT_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(xlsx_err)?;
        }
        for (idx, row) in rows.iter().enumerate() {
            let row_num = u32::try_from(idx + 1)
                .map_err(|_| xlsx_err(XlsxError::RowColumnLimitError))?;
            for (col, value) in row.cells().iter().enumerate() {
                worksheet
                    .write_string(row_num, col as u16, *value)
                    .map_err(xlsx_err)?;
            }
        }

        workbook.save(path).map_err(xlsx_err)?;
        Ok(path.clone())
    }
}

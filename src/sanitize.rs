//! Spreadsheet Cell Sanitizer
//!
//! Removes characters a spreadsheet cell cannot hold. Coinbase scripts are
//! arbitrary bytes, so decoded text routinely carries control characters that
//! XLSX writers reject or mangle.

use std::borrow::Cow;

use crate::record::TransactionRecord;

/// Longest text an XLSX cell can hold, in characters
pub const MAX_CELL_CHARS: usize = 32_767;

/// Which characters survive sanitization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeMode {
    /// Drop characters not allowed in XLSX cell text: C0 controls other than
    /// tab, line feed and carriage return, plus U+FFFE and U+FFFF
    #[default]
    Spreadsheet,
    /// Keep only printable ASCII (0x20..=0x7E)
    PrintableAscii,
}

impl SanitizeMode {
    /// Whether `c` may appear in a sanitized string
    pub fn allows(self, c: char) -> bool {
        match self {
            SanitizeMode::Spreadsheet => match c {
                '\t' | '\n' | '\r' => true,
                '\u{FFFE}' | '\u{FFFF}' => false,
                c => c >= ' ',
            },
            SanitizeMode::PrintableAscii => (' '..='~').contains(&c),
        }
    }
}

/// Sanitize for spreadsheet export using the default mode
pub fn sanitize(value: &str) -> Cow<'_, str> {
    sanitize_with(value, SanitizeMode::default())
}

/// Remove every character `mode` does not allow, then truncate to
/// `MAX_CELL_CHARS` characters.
///
/// Borrows when nothing needs changing. Idempotent.
pub fn sanitize_with(value: &str, mode: SanitizeMode) -> Cow<'_, str> {
    let mut count = 0;
    let clean = value.chars().all(|c| {
        count += 1;
        mode.allows(c) && count <= MAX_CELL_CHARS
    });
    if clean {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(
            value
                .chars()
                .filter(|&c| mode.allows(c))
                .take(MAX_CELL_CHARS)
                .collect(),
        )
    }
}

fn sanitize_in_place(field: &mut String, mode: SanitizeMode) {
    if let Cow::Owned(clean) = sanitize_with(field, mode) {
        *field = clean;
    }
}

/// Sanitize every string field of a record in place
pub fn sanitize_record(record: &mut TransactionRecord, mode: SanitizeMode) {
    for field in [
        &mut record.input_script,
        &mut record.tx_hash,
        &mut record.timestamp,
        &mut record.date,
        &mut record.decoded_utf8,
        &mut record.decoded_ascii,
        &mut record.decoded_hex,
    ] {
        sanitize_in_place(field, mode);
    }
    for field in [&mut record.pool_name, &mut record.pool_link].into_iter().flatten() {
        sanitize_in_place(field, mode);
    }
}

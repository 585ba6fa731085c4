use std::borrow::Cow;
use std::io::Cursor;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

pub const COLUMN_COUNT: usize = 8;

/// One non-blank line split into its raw, untrimmed fields.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line_number: usize,
    pub fields: StringRecord,
}

impl RawRow {
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Invalid column count (must be 8 columns).")]
    ColumnCount { line_number: usize, found: usize },
    // Reader errors are I/O or UTF-8 failures, neither of which an in-memory
    // `&str` produces; the variant keeps the reader's `Result` fully mapped.
    #[error("Unreadable line: {message}")]
    Unreadable { line_number: usize, message: String },
}

impl RowError {
    pub fn line_number(&self) -> usize {
        match self {
            RowError::ColumnCount { line_number, .. } => *line_number,
            RowError::Unreadable { line_number, .. } => *line_number,
        }
    }
}

/// Splits `record` into a row when it has exactly [`COLUMN_COUNT`] fields.
pub fn split_row(record: StringRecord, line_number: usize) -> Result<RawRow, RowError> {
    if record.len() != COLUMN_COUNT {
        return Err(RowError::ColumnCount {
            line_number,
            found: record.len(),
        });
    }
    Ok(RawRow {
        line_number,
        fields: record,
    })
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|field| field.trim().is_empty())
}

// The reader only counts `\n` when numbering lines, so a lone `\r` becomes
// `\n` first.
fn normalize_line_endings(content: &str) -> Cow<'_, [u8]> {
    if !content.contains('\r') {
        return Cow::Borrowed(content.as_bytes());
    }
    Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n").into_bytes())
}

/// Reads every non-blank line of `content`. `\n`, `\r\n` and `\r` all end a line.
///
/// Fields are split on every comma: quotes carry no meaning, so a quoted comma
/// still separates two columns.
pub fn rows(content: &str) -> impl Iterator<Item = Result<RawRow, RowError>> + '_ {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(Cursor::new(normalize_line_endings(content)));

    reader.into_records().filter_map(|result| match result {
        Ok(record) => {
            if is_blank(&record) {
                return None;
            }
            let line_number = record
                .position()
                .map(|position| position.line() as usize)
                .unwrap_or(0);
            Some(split_row(record, line_number))
        }
        Err(e) => {
            let line_number = e
                .position()
                .map(|position| position.line() as usize)
                .unwrap_or(0);
            Some(Err(RowError::Unreadable {
                line_number,
                message: e.to_string(),
            }))
        }
    })
}

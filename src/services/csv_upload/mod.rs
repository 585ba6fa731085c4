//! Bulk CSV ingestion: an upload is validated line by line and then either
//! committed as a whole or rejected with one diagnostic per failing line.

pub mod batch_validator;
pub mod field_validators;
pub mod row_parser;

use std::borrow::Cow;

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::Diagnostic;
use crate::store::{InvalidRecordStore, TransactionStore};

pub use batch_validator::{candidate_references, validate_batch, BatchReport};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const REJECTED_MESSAGE: &str = "File contains invalid records. File rejected.";
pub const ACCEPTED_MESSAGE: &str = "File uploaded successfully.";
pub const NO_FILE_MESSAGE: &str = "No file uploaded.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Committed { records_inserted: usize },
    Rejected { diagnostics: Vec<Diagnostic> },
}

impl UploadOutcome {
    /// `Line <n>: <reason>` for every diagnostic, in file order.
    pub fn error_lines(&self) -> Vec<String> {
        match self {
            UploadOutcome::Committed { .. } => Vec::new(),
            UploadOutcome::Rejected { diagnostics } => {
                diagnostics.iter().map(Diagnostic::to_string).collect()
            }
        }
    }
}

pub fn oversize_message(max_bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if max_bytes >= MIB && max_bytes % MIB == 0 {
        format!("File size exceeds {} MB.", max_bytes / MIB)
    } else if max_bytes >= KIB && max_bytes % KIB == 0 {
        format!("File size exceeds {} KB.", max_bytes / KIB)
    } else {
        format!("File size exceeds {} bytes.", max_bytes)
    }
}

/// Checks the upload preconditions and decodes the file as UTF-8 text.
///
/// Invalid byte sequences are replaced and a leading byte order mark is
/// dropped. Nothing is read from or written to a store.
pub fn decode_upload(file: Option<&[u8]>, max_bytes: usize) -> Result<Cow<'_, str>, AppError> {
    let bytes = match file {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(AppError::Validation(NO_FILE_MESSAGE.to_string())),
    };
    if bytes.len() > max_bytes {
        return Err(AppError::Validation(oversize_message(max_bytes)));
    }

    let text = String::from_utf8_lossy(bytes);
    Ok(match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Cow::Owned(s) => match s.strip_prefix('\u{feff}') {
            Some(stripped) => Cow::Owned(stripped.to_string()),
            None => Cow::Owned(s),
        },
    })
}

/// Validates `content` and commits or rejects it as a single batch.
///
/// Only store failures are returned as errors. A commit-time key conflict
/// surfaces as [`AppError::Conflict`] and a value wider than its column as
/// [`AppError::Validation`]; either leaves both stores untouched.
pub async fn ingest(
    records: &dyn TransactionStore,
    invalid_records: &dyn InvalidRecordStore,
    content: &str,
) -> Result<UploadOutcome, AppError> {
    let candidates = candidate_references(content);
    let persisted = records.existing_references(&candidates).await?;

    let report = validate_batch(content, &persisted);

    if !report.is_valid() {
        warn!(
            "Upload rejected: {} invalid lines, {} valid lines discarded",
            report.diagnostics.len(),
            report.transactions.len()
        );
        invalid_records.append(&report.diagnostics, Utc::now()).await?;
        return Ok(UploadOutcome::Rejected {
            diagnostics: report.diagnostics,
        });
    }

    let records_inserted = report.transactions.len();
    records.insert_batch(report.transactions).await?;
    info!("Upload committed: {} transactions inserted", records_inserted);

    Ok(UploadOutcome::Committed { records_inserted })
}

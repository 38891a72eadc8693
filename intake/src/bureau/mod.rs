//! SLIK credit-bureau report parsing.
//!
//! A report arrives either as a JSON export (any envelope, any key casing)
//! or as delimited text with or without a header row. Both end up as a
//! [`BureauTable`]; consumers read it through [`BureauTable::lookup`], so the
//! physical layout never leaks past this module.
//!
//! Parsing never fails. Unrecognised input degrades to a single-column
//! table with one row per line.

mod classify;
mod delimited;
mod lookup;

pub use classify::{classify, find_debtor_name, ReportShape, EXPECTED_KEYS};
pub use delimited::SINGLE_COLUMN_HEADER;
pub use lookup::{kualitas_description, kualitas_grade, normalize_key, BureauField};

use std::path::Path;

use tracing::{debug, info};

use crate::error::{IntakeError, Result};
use crate::models::BureauTable;

/// Parses a report of unknown encoding into a table.
pub fn parse_bureau_report(text: &str) -> BureauTable {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(root) => {
                if let Some(table) = classify(&root).into_table(&root) {
                    debug!(
                        rows = table.rows.len(),
                        score = table.match_score,
                        "Parsed JSON bureau report"
                    );
                    return table;
                }
                debug!("JSON bureau report has no SLIK records, parsing as text");
            }
            Err(e) => debug!("Bureau report is not valid JSON, parsing as text: {}", e),
        }
    }

    delimited::parse_lines(text)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// Parses raw report bytes, dropping a UTF-8 BOM and replacing invalid
/// sequences.
pub fn parse_bureau_bytes(bytes: &[u8]) -> BureauTable {
    let text = String::from_utf8_lossy(strip_bom(bytes));
    parse_bureau_report(&text)
}

/// Reads and parses a `.txt` report from disk, enforcing the upload limit.
pub async fn load_bureau_report(path: impl AsRef<Path>, max_bytes: u64) -> Result<BureauTable> {
    let path = path.as_ref();

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime != mime_guess::mime::TEXT_PLAIN {
        return Err(IntakeError::UnsupportedFormat(format!(
            "bureau report must be a .txt file, got {mime}"
        )));
    }

    let size = tokio::fs::metadata(path).await?.len();
    if size > max_bytes {
        return Err(IntakeError::ReportTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await?;
    let table = parse_bureau_bytes(&bytes);
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        "Loaded bureau report"
    );
    Ok(table)
}

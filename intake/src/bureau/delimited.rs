//! Line-based fallback for reports pasted or exported as plain text.

use crate::models::{BureauRow, BureauTable};

/// Column name used when the report has no detectable delimiter.
pub const SINGLE_COLUMN_HEADER: &str = "Data SLIK";

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Picks the delimiter with the most occurrences on the first line.
fn detect_delimiter(first_line: &str) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for &delimiter in &DELIMITERS {
        let count = first_line.bytes().filter(|b| *b == delimiter).count();
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((delimiter, count));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// Splits one line on every occurrence of `delimiter`. Quotes are plain
/// text, so a stray `"` cannot swallow the rest of the row.
fn split_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|cell| cell.to_string()).collect(),
        _ => line
            .split(char::from(delimiter))
            .map(|cell| cell.trim().to_string())
            .collect(),
    }
}

fn is_header_row(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|cell| cell.chars().any(|c| c.is_alphabetic()))
}

pub(super) fn parse_lines(text: &str) -> BureauTable {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return BureauTable::default();
    };

    let Some(delimiter) = detect_delimiter(first) else {
        return BureauTable {
            headers: vec![SINGLE_COLUMN_HEADER.to_string()],
            rows: lines
                .iter()
                .map(|line| BureauRow::Cells(vec![line.to_string()]))
                .collect(),
            meta: None,
            match_score: 0,
        };
    };

    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .map(|line| split_line(line, delimiter))
        .collect();

    let headers = if is_header_row(&rows[0]) {
        rows.remove(0)
    } else {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        (1..=width).map(|n| format!("Kolom {n}")).collect()
    };

    BureauTable {
        headers,
        rows: rows.into_iter().map(BureauRow::Cells).collect(),
        meta: None,
        match_score: 0,
    }
}

//! Shape detection for JSON bureau reports.
//!
//! SLIK exports arrive as anything from a bare array of facilities to a
//! response envelope with the facilities several levels down. Every array of
//! records in the tree is a candidate; the one whose keys best cover the
//! expected SLIK columns is taken as the report body.

use serde_json::{Map, Value};

use super::lookup::normalize_key;
use crate::models::{BureauMeta, BureauRow, BureauTable};

/// Nesting levels walked before a subtree is ignored.
pub(crate) const MAX_DEPTH: usize = 32;

/// Normalized keys of a SLIK facility record.
pub const EXPECTED_KEYS: [&str; 13] = [
    "namadebitur",
    "ljkket",
    "jeniskreditpembiayaan",
    "jeniskreditpembiayaanket",
    "plafon",
    "bakidebet",
    "sukubungaimbalan",
    "tanggalakadawal",
    "tanggaljatuhtempo",
    "jumlahharitunggakan",
    "kualitas",
    "kualitasket",
    "kondisi",
];

/// Keys that carry the debtor's name, most specific first.
const DEBTOR_NAME_KEYS: [&str; 3] = ["namadebitur", "namalengkap", "nama"];

/// What a decoded report looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportShape<'a> {
    /// The best-scoring array of records found anywhere in the tree.
    RecordList {
        records: Vec<&'a Map<String, Value>>,
        score: usize,
    },
    /// The root object is itself one facility record.
    SingleRecord {
        record: &'a Map<String, Value>,
        score: usize,
    },
    /// Nothing recognisable; parse the text line by line.
    Lines,
}

struct Candidate<'a> {
    records: Vec<&'a Map<String, Value>>,
    score: usize,
}

fn collect_candidates<'a>(value: &'a Value, depth: usize, out: &mut Vec<Candidate<'a>>) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            let records: Vec<&Map<String, Value>> =
                items.iter().filter_map(Value::as_object).collect();
            if !records.is_empty() {
                let score = score_records(&records);
                out.push(Candidate { records, score });
            }
            for item in items {
                collect_candidates(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            for child in map.values() {
                collect_candidates(child, depth + 1, out);
            }
        }
        _ => {}
    }
}

fn collect_keys(record: &Map<String, Value>, depth: usize, keys: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    for (key, value) in record {
        let key = normalize_key(key);
        if !keys.contains(&key) {
            keys.push(key);
        }
        if let Value::Object(nested) = value {
            collect_keys(nested, depth + 1, keys);
        }
    }
}

fn score_records(records: &[&Map<String, Value>]) -> usize {
    let mut keys = Vec::new();
    for record in records {
        collect_keys(record, 0, &mut keys);
    }
    EXPECTED_KEYS
        .iter()
        .filter(|expected| keys.iter().any(|key| key == *expected))
        .count()
}

/// Classifies a decoded report.
pub fn classify(root: &Value) -> ReportShape<'_> {
    let mut candidates = Vec::new();
    collect_candidates(root, 0, &mut candidates);

    let mut best: Option<Candidate<'_>> = None;
    for candidate in candidates {
        let better = match &best {
            None => candidate.score > 0,
            Some(current) => {
                (candidate.score, candidate.records.len())
                    > (current.score, current.records.len())
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    if let Some(best) = best {
        return ReportShape::RecordList {
            records: best.records,
            score: best.score,
        };
    }

    if let Value::Object(record) = root {
        let score = score_records(&[record]);
        if score > 0 {
            return ReportShape::SingleRecord { record, score };
        }
    }

    ReportShape::Lines
}

fn search_debtor_name(value: &Value, depth: usize, best: &mut Option<(usize, String)>) {
    if depth > MAX_DEPTH || matches!(best, Some((0, _))) {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = normalize_key(key);
                let rank = DEBTOR_NAME_KEYS.iter().position(|k| *k == key);
                if let (Some(rank), Some(name)) = (rank, child.as_str()) {
                    let name = name.trim();
                    let outranks = best.as_ref().map_or(true, |(current, _)| rank < *current);
                    if !name.is_empty() && outranks {
                        *best = Some((rank, name.to_string()));
                    }
                }
                search_debtor_name(child, depth + 1, best);
            }
        }
        Value::Array(items) => {
            for item in items {
                search_debtor_name(item, depth + 1, best);
            }
        }
        _ => {}
    }
}

/// Debtor name found anywhere in the report, preferring `namaDebitur`.
pub fn find_debtor_name(root: &Value) -> Option<String> {
    let mut best = None;
    search_debtor_name(root, 0, &mut best);
    best.map(|(_, name)| name)
}

fn record_table(records: &[&Map<String, Value>], score: usize, root: &Value) -> BureauTable {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    BureauTable {
        headers,
        rows: records
            .iter()
            .map(|record| BureauRow::Record((*record).clone()))
            .collect(),
        meta: find_debtor_name(root).map(|name| BureauMeta {
            debtor_name: Some(name),
        }),
        match_score: score,
    }
}

impl ReportShape<'_> {
    /// Builds the table for a JSON shape. `None` for [`ReportShape::Lines`].
    pub fn into_table(self, root: &Value) -> Option<BureauTable> {
        match self {
            ReportShape::RecordList { records, score } => {
                Some(record_table(&records, score, root))
            }
            ReportShape::SingleRecord { record, score } => {
                Some(record_table(&[record], score, root))
            }
            ReportShape::Lines => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_array_is_found() {
        let root = json!({
            "status": "ok",
            "result": {
                "fasilitas": [
                    {"namaDebitur": "A", "plafon": "1000000", "kualitas": "1"},
                    {"namaDebitur": "A", "plafon": "5000000", "kualitas": "2"}
                ]
            }
        });
        match classify(&root) {
            ReportShape::RecordList { records, score } => {
                assert_eq!(records.len(), 2);
                assert_eq!(score, 3);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_higher_score_beats_longer_list() {
        let root = json!({
            "logs": [{"id": 1}, {"id": 2}, {"id": 3}],
            "history": [{"ljkKet": "BANK X", "bakiDebet": 10, "kondisi": "Lunas"}]
        });
        match classify(&root) {
            ReportShape::RecordList { records, score } => {
                assert_eq!(records.len(), 1);
                assert_eq!(score, 3);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_ties_broken_by_row_count() {
        let root = json!({
            "a": [{"plafon": 1}],
            "b": [{"plafon": 2}, {"plafon": 3}]
        });
        match classify(&root) {
            ReportShape::RecordList { records, .. } => assert_eq!(records.len(), 2),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_nested_record_keys_count() {
        let root = json!([{"fasilitas": {"Baki Debet": 1, "Suku Bunga/Imbalan": "9%"}}]);
        match classify(&root) {
            ReportShape::RecordList { score, .. } => assert_eq!(score, 2),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_single_record_root() {
        let root = json!({"namaDebitur": "BUDI", "kualitas": "1"});
        assert!(matches!(
            classify(&root),
            ReportShape::SingleRecord { score: 2, .. }
        ));
    }

    #[test]
    fn test_unrelated_json_falls_back_to_lines() {
        assert_eq!(classify(&json!({"foo": [{"bar": 1}]})), ReportShape::Lines);
        assert_eq!(classify(&json!([1, 2, 3])), ReportShape::Lines);
    }

    #[test]
    fn test_debtor_name_prefers_nama_debitur() {
        let root = json!({
            "nama": "PT PELAPOR",
            "debitur": {"namaLengkap": "SITI"},
            "data": [{"namaDebitur": "SITI AMINAH"}]
        });
        assert_eq!(find_debtor_name(&root).as_deref(), Some("SITI AMINAH"));

        let root = json!({"nama": "BUDI", "data": []});
        assert_eq!(find_debtor_name(&root).as_deref(), Some("BUDI"));
    }

    #[test]
    fn test_depth_bound_stops_walk() {
        let mut value = json!([{"plafon": 1}]);
        for _ in 0..(MAX_DEPTH + 4) {
            value = json!({ "inner": value });
        }
        assert_eq!(classify(&value), ReportShape::Lines);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a bureau report: positional cells when the report was
/// delimited text, or the original key-value record when it was JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BureauRow {
    Cells(Vec<String>),
    Record(Map<String, Value>),
}

impl BureauRow {
    pub fn len(&self) -> usize {
        match self {
            BureauRow::Cells(cells) => cells.len(),
            BureauRow::Record(record) => record.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debtor_name: Option<String>,
}

/// Normalized SLIK report table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauTable {
    pub headers: Vec<String>,
    pub rows: Vec<BureauRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BureauMeta>,
    /// Number of expected SLIK keys the selected JSON records carried;
    /// zero for delimited text.
    pub match_score: usize,
}

impl BureauTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn debtor_name(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.debtor_name.as_deref())
    }
}

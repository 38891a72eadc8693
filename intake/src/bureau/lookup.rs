use serde_json::{Map, Value};

use super::classify::MAX_DEPTH;
use crate::models::{BureauRow, BureauTable};

/// Lowercases and drops everything but letters and digits, so
/// `"Nama Debitur"`, `"nama_debitur"` and `"namaDebitur"` compare equal.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Logical SLIK facility fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BureauField {
    NamaDebitur,
    LjkKet,
    JenisKreditPembiayaan,
    JenisKreditPembiayaanKet,
    Plafon,
    BakiDebet,
    SukuBungaImbalan,
    TanggalAkadAwal,
    TanggalJatuhTempo,
    JumlahHariTunggakan,
    Kualitas,
    KualitasKet,
    Kondisi,
}

impl BureauField {
    pub const ALL: [BureauField; 13] = [
        BureauField::NamaDebitur,
        BureauField::LjkKet,
        BureauField::JenisKreditPembiayaan,
        BureauField::JenisKreditPembiayaanKet,
        BureauField::Plafon,
        BureauField::BakiDebet,
        BureauField::SukuBungaImbalan,
        BureauField::TanggalAkadAwal,
        BureauField::TanggalJatuhTempo,
        BureauField::JumlahHariTunggakan,
        BureauField::Kualitas,
        BureauField::KualitasKet,
        BureauField::Kondisi,
    ];

    /// Normalized key, as produced by [`normalize_key`].
    pub fn key(&self) -> &'static str {
        match self {
            BureauField::NamaDebitur => "namadebitur",
            BureauField::LjkKet => "ljkket",
            BureauField::JenisKreditPembiayaan => "jeniskreditpembiayaan",
            BureauField::JenisKreditPembiayaanKet => "jeniskreditpembiayaanket",
            BureauField::Plafon => "plafon",
            BureauField::BakiDebet => "bakidebet",
            BureauField::SukuBungaImbalan => "sukubungaimbalan",
            BureauField::TanggalAkadAwal => "tanggalakadawal",
            BureauField::TanggalJatuhTempo => "tanggaljatuhtempo",
            BureauField::JumlahHariTunggakan => "jumlahharitunggakan",
            BureauField::Kualitas => "kualitas",
            BureauField::KualitasKet => "kualitasket",
            BureauField::Kondisi => "kondisi",
        }
    }
}

/// Standard description of a collectibility grade.
pub fn kualitas_description(grade: u8) -> Option<&'static str> {
    match grade {
        1 => Some("Lancar"),
        2 => Some("Dalam Perhatian Khusus"),
        3 => Some("Kurang Lancar"),
        4 => Some("Diragukan"),
        5 => Some("Macet"),
        _ => None,
    }
}

/// Reads a collectibility grade from values like `"1"`, `"Kol 2"` or
/// `"3 - Kurang Lancar"`.
pub fn kualitas_grade(value: &str) -> Option<u8> {
    let mut digits = value.trim().chars().filter(|c| c.is_ascii_digit());
    let grade = digits.next()?.to_digit(10)? as u8;
    (digits.next().is_none() && (1..=5).contains(&grade)).then_some(grade)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn find_in_record(record: &Map<String, Value>, key: &str, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }
    let direct = record
        .iter()
        .find(|(k, _)| normalize_key(k) == key)
        .and_then(|(_, value)| scalar_text(value));
    if direct.is_some() {
        return direct;
    }
    record
        .values()
        .filter_map(Value::as_object)
        .find_map(|nested| find_in_record(nested, key, depth + 1))
}

impl BureauTable {
    /// Position of the header matching `field`, for cell rows.
    pub fn column_index(&self, field: BureauField) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| normalize_key(header) == field.key())
    }

    /// Resolves a logical field from a row, independent of column order
    /// and of whether the row is positional or keyed.
    pub fn lookup(&self, row: &BureauRow, field: BureauField) -> Option<String> {
        match row {
            BureauRow::Cells(cells) => {
                let cell = cells.get(self.column_index(field)?)?.trim();
                (!cell.is_empty()).then(|| cell.to_string())
            }
            BureauRow::Record(record) => find_in_record(record, field.key(), 0),
        }
    }
}

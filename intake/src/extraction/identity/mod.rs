//! OCR text → [`CanonicalIdentityRecord`].
//!
//! Extraction is pure and never fails: a field that cannot be read is left
//! empty. Every value passes through [`normalize_record`] so that labels
//! mis-captured into a value and non-canonical vocabulary never leave this
//! module.

mod date;
mod fields;
mod labels;

pub use date::{normalize_date, PIVOT_YEAR};

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{CanonicalIdentityRecord, IdentityField};
use labels::{fold, strip_label_prefix, words_pattern, Label};

static CITIZEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{}|{})",
        words_pattern("WNI"),
        words_pattern("INDONESIA")
    ))
    .unwrap()
});
static FOREIGNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{}|{})",
        words_pattern("WNA"),
        words_pattern("ASING")
    ))
    .unwrap()
});

/// Folded spellings → canonical religion, as printed on current cards.
static RELIGIONS: LazyLock<Vec<(String, &'static str)>> = LazyLock::new(|| {
    [
        ("ISLAM", "ISLAM"),
        ("KRISTEN", "KRISTEN"),
        ("PROTESTAN", "KRISTEN"),
        ("KATHOLIK", "KATOLIK"),
        ("KATOLIK", "KATOLIK"),
        ("HINDU", "HINDU"),
        ("BUDDHA", "BUDDHA"),
        ("BUDHA", "BUDDHA"),
        ("KHONGHUCU", "KONGHUCU"),
        ("KONGHUCU", "KONGHUCU"),
    ]
    .into_iter()
    .map(|(spelling, canonical)| (fold(spelling), canonical))
    .collect()
});

/// Checked in order: "BELUM KAWIN" and "CERAI ..." both contain "KAWIN"-like
/// words, so the plain status goes last.
static MARITAL_STATUSES: LazyLock<Vec<(String, &'static str)>> = LazyLock::new(|| {
    [
        ("BELUM", "BELUM KAWIN"),
        ("HIDUP", "CERAI HIDUP"),
        ("MATI", "CERAI MATI"),
        ("KAWIN", "KAWIN"),
    ]
    .into_iter()
    .map(|(keyword, canonical)| (fold(keyword), canonical))
    .collect()
});

/// Reads a KTP record out of raw OCR text.
pub fn extract(text: &str) -> CanonicalIdentityRecord {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut record = CanonicalIdentityRecord::default();

    if let Some(nik) = fields::nik(&lines) {
        record.set(IdentityField::Nik, nik);
    }
    if let Some(nama) = fields::nama(&lines) {
        record.set(IdentityField::NamaLengkap, nama);
    }
    if let Some((place, date)) = fields::birth(&lines) {
        record.set(IdentityField::TempatLahir, place);
        if let Some(date) = date {
            record.set(IdentityField::TanggalLahir, date);
        }
    }
    if let Some(gender) = fields::jenis_kelamin(&lines, text) {
        record.set(IdentityField::JenisKelamin, gender);
    }
    if let Some(alamat) = fields::alamat(&lines) {
        record.set(IdentityField::AlamatLengkap, alamat);
    }
    if let Some((rt, rw, _)) = fields::rt_rw(&lines) {
        record.set(IdentityField::Rt, rt);
        record.set(IdentityField::Rw, rw);
    }

    let labelled = [
        (
            IdentityField::DesaKelurahan,
            Label::KelDesa,
            &[Label::Kecamatan, Label::Agama, Label::RtRw, Label::Kabupaten][..],
        ),
        (
            IdentityField::Kecamatan,
            Label::Kecamatan,
            &[Label::Agama, Label::StatusPerkawinan, Label::KelDesa, Label::Kabupaten][..],
        ),
        (
            IdentityField::Agama,
            Label::Agama,
            &[
                Label::StatusPerkawinan,
                Label::Pekerjaan,
                Label::Kewarganegaraan,
                Label::BerlakuHingga,
                Label::JenisKelamin,
                Label::GolDarah,
                Label::Alamat,
            ][..],
        ),
        (
            IdentityField::StatusPerkawinan,
            Label::StatusPerkawinan,
            &[
                Label::Pekerjaan,
                Label::Kewarganegaraan,
                Label::BerlakuHingga,
                Label::Agama,
            ][..],
        ),
        (
            IdentityField::Jenispekerjaan,
            Label::Pekerjaan,
            &[
                Label::Kewarganegaraan,
                Label::BerlakuHingga,
                Label::StatusPerkawinan,
                Label::Agama,
            ][..],
        ),
        (
            IdentityField::Provinsi,
            Label::Provinsi,
            &[Label::Kabupaten, Label::Kota, Label::Nik][..],
        ),
    ];
    for (field, label, stops) in labelled {
        if let Some(value) = fields::labelled(&lines, label, stops) {
            record.set(field, value);
        }
    }

    if let Some(kabupaten) = fields::kabupaten(&lines) {
        record.set(IdentityField::Kabupaten, kabupaten);
    }
    if let Some(citizenship) = fields::kewarganegaraan(&lines) {
        record.set(IdentityField::Kewarganegaraan, citizenship);
    }

    let record = normalize_record(record);
    debug!(
        filled = record.filled_count(),
        lines = lines.len(),
        "Extracted identity fields from OCR text"
    );
    record
}

/// Closed citizenship vocabulary: `"WNI"`, `"WNA"` or `""`.
pub fn citizenship(value: &str) -> &'static str {
    let folded = fold(value);
    if CITIZEN.is_match(&folded) {
        "WNI"
    } else if FOREIGNER.is_match(&folded) {
        "WNA"
    } else {
        ""
    }
}

fn canonical_from(table: &[(String, &'static str)], value: &str) -> Option<&'static str> {
    let folded = fold(value);
    table
        .iter()
        .find(|(spelling, _)| folded.contains(spelling.as_str()))
        .map(|(_, canonical)| *canonical)
}

/// Applies the value invariants to every field of a record, whatever
/// produced it: label prefixes stripped, whitespace collapsed, dates in ISO
/// form, and closed vocabularies mapped onto their canonical spellings.
pub fn normalize_record(record: CanonicalIdentityRecord) -> CanonicalIdentityRecord {
    let mut normalized = CanonicalIdentityRecord::default();

    for field in IdentityField::ALL {
        let raw = record.get(field);
        if raw.trim().is_empty() {
            continue;
        }
        let value = strip_label_prefix(raw);
        let value = match field {
            IdentityField::Nik => {
                let digits: String = date::repair_digits(&value)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                if digits.len() == 16 && digits.chars().all(|c| c.is_ascii_digit()) {
                    digits
                } else {
                    value
                }
            }
            IdentityField::TanggalLahir => normalize_date(&value).unwrap_or_default(),
            IdentityField::JenisKelamin => fields::gender_of(&value)
                .unwrap_or_default()
                .to_string(),
            IdentityField::Kewarganegaraan => citizenship(&value).to_string(),
            IdentityField::Agama => canonical_from(&RELIGIONS, &value)
                .map(str::to_string)
                .unwrap_or(value),
            IdentityField::StatusPerkawinan => canonical_from(&MARITAL_STATUSES, &value)
                .map(str::to_string)
                .unwrap_or(value),
            _ => value,
        };
        normalized.set(field, value);
    }

    normalized
}

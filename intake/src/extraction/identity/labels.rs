//! KTP label vocabulary and OCR-tolerant label matching.
//!
//! Matching runs on a *folded* copy of the text: ASCII-uppercased, with the
//! characters OCR engines confuse with letters mapped onto those letters
//! (`0→O`, `1/l/|/L→I`, `5→S`, `4→A`, `7→T`). Folding replaces one ASCII
//! char with one ASCII char, so byte offsets found in the folded copy are
//! valid in the original and values are always sliced from the original.

use std::sync::LazyLock;

use regex::Regex;

/// Field labels printed on a KTP, plus the non-captured ones (blood type,
/// validity) that still terminate neighbouring values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    Nik,
    Nama,
    TempatTglLahir,
    JenisKelamin,
    GolDarah,
    Alamat,
    RtRw,
    KelDesa,
    Kecamatan,
    Agama,
    StatusPerkawinan,
    Pekerjaan,
    Kewarganegaraan,
    BerlakuHingga,
    Kabupaten,
    Provinsi,
    /// City header. Only used to locate the regency line, never stripped.
    Kota,
}

impl Label {
    const ALL: [Label; 17] = [
        Label::Nik,
        Label::Nama,
        Label::TempatTglLahir,
        Label::JenisKelamin,
        Label::GolDarah,
        Label::Alamat,
        Label::RtRw,
        Label::KelDesa,
        Label::Kecamatan,
        Label::Agama,
        Label::StatusPerkawinan,
        Label::Pekerjaan,
        Label::Kewarganegaraan,
        Label::BerlakuHingga,
        Label::Kabupaten,
        Label::Provinsi,
        Label::Kota,
    ];

    fn phrases(&self) -> &'static [&'static str] {
        match self {
            Label::Nik => &["NIK", "NO KTP"],
            Label::Nama => &["NAMA LENGKAP", "NAMA"],
            Label::TempatTglLahir => &[
                "TEMPAT TGL LAHIR",
                "TEMPAT TANGGAL LAHIR",
                "TMPT TGL LAHIR",
                "TEMPAT TGL LHR",
                "TEMPAT LAHIR",
                "TGL LAHIR",
                "TTL",
            ],
            Label::JenisKelamin => &["JENIS KELAMIN", "JNS KELAMIN", "KELAMIN"],
            Label::GolDarah => &["GOLONGAN DARAH", "GOL DARAH"],
            Label::Alamat => &["ALAMAT"],
            Label::RtRw => &["RT RW"],
            Label::KelDesa => &[
                "KEL DESA",
                "KELURAHAN DESA",
                "DESA KELURAHAN",
                "KELURAHAN",
                "DESA",
                "KEL",
            ],
            Label::Kecamatan => &["KECAMATAN", "KEC"],
            Label::Agama => &["AGAMA"],
            Label::StatusPerkawinan => &["STATUS PERKAWINAN", "STATUS KAWIN", "PERKAWINAN"],
            Label::Pekerjaan => &["PEKERJAAN"],
            Label::Kewarganegaraan => &[
                "KEWARGANEGARAAN",
                "KEWARGA NEGARAAN",
                "KEWARGANEGARAN",
                "WARGA NEGARA",
            ],
            Label::BerlakuHingga => &["BERLAKU HINGGA", "BERLAKU"],
            Label::Kabupaten => &["KABUPATEN", "KAB"],
            Label::Provinsi => &["PROVINSI", "PROPINSI", "PROV"],
            Label::Kota => &["KOTA"],
        }
    }

    /// Labels that mark the start of a new field. `Kota` is excluded: it is
    /// part of a city name, not a prefix to strip.
    fn is_structural(&self) -> bool {
        !matches!(self, Label::Kota)
    }
}

/// Folds one char for label comparison. Always ASCII→ASCII or identity.
fn fold_char(c: char) -> char {
    match c.to_ascii_uppercase() {
        '0' => 'O',
        '1' | 'L' | '|' | '!' => 'I',
        '5' => 'S',
        '4' => 'A',
        '7' => 'T',
        other => other,
    }
}

pub(crate) fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Regex source for a list of words, folded and tolerant of the
/// separators OCR puts between label words ("TEMPAT/TGL. LAHIR").
pub(crate) fn words_pattern(phrase: &str) -> String {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    let mut pattern = tokens
        .iter()
        .map(|token| regex::escape(&fold(token)))
        .collect::<Vec<_>>()
        .join(r"[\s./\\\-]*");
    // Short trailing words need a boundary or "KEL" would match "KELAPA".
    if tokens.last().is_some_and(|t| t.len() <= 4) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn alternation(phrases: &[&str]) -> String {
    let mut sorted: Vec<&str> = phrases.to_vec();
    sorted.sort_by_key(|p| std::cmp::Reverse(p.len()));
    sorted
        .iter()
        .map(|p| words_pattern(p))
        .collect::<Vec<_>>()
        .join("|")
}

struct LabelPattern {
    label: Label,
    /// Label at the start of a line, after leading punctuation.
    anchored: Regex,
    /// Label as a word anywhere in the text.
    anywhere: Regex,
}

static PATTERNS: LazyLock<Vec<LabelPattern>> = LazyLock::new(|| {
    Label::ALL
        .iter()
        .map(|label| {
            let alts = alternation(label.phrases());
            LabelPattern {
                label: *label,
                anchored: Regex::new(&format!(r"^[^A-Z0-9]*(?:{alts})")).unwrap(),
                anywhere: Regex::new(&format!(r"\b(?:{alts})")).unwrap(),
            }
        })
        .collect()
});

// `Label::ALL` is in declaration order, so the discriminant indexes PATTERNS.
fn pattern(label: Label) -> &'static LabelPattern {
    &PATTERNS[label as usize]
}

/// Characters that separate a label from its value.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | ';' | '=' | '.' | ',' | '-' | '_' | '|' | '~')
}

/// Trims separator punctuation from both ends and collapses inner whitespace.
pub(crate) fn clean(value: &str) -> String {
    value
        .trim_matches(is_separator)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset just past `label` when the line starts with it.
pub(crate) fn label_end(line: &str, label: Label) -> Option<usize> {
    pattern(label).anchored.find(&fold(line)).map(|m| m.end())
}

/// Text following `label` on the same line, uncleaned. `None` when the
/// line does not start with the label.
pub(crate) fn after_label(line: &str, label: Label) -> Option<&str> {
    label_end(line, label).map(|end| &line[end..])
}

/// Whether the line starts with any field label.
pub(crate) fn is_label_line(line: &str) -> bool {
    let folded = fold(line);
    PATTERNS
        .iter()
        .filter(|p| p.label.is_structural())
        .any(|p| p.anchored.is_match(&folded))
}

/// Whether any field label other than `except` appears anywhere in `text`.
pub(crate) fn contains_other_label(text: &str, except: Label) -> bool {
    let folded = fold(text);
    PATTERNS
        .iter()
        .filter(|p| p.label.is_structural() && p.label != except)
        .any(|p| p.anywhere.is_match(&folded))
}

/// Cuts `value` at the first occurrence of any of the `stops` labels.
pub(crate) fn cut_at_labels<'a>(value: &'a str, stops: &[Label]) -> &'a str {
    let folded = fold(value);
    let cut = stops
        .iter()
        .filter_map(|label| pattern(*label).anywhere.find(&folded))
        .map(|m| m.start())
        .min()
        .unwrap_or(value.len());
    &value[..cut]
}

/// Cuts `value` at the first field label other than `except`.
pub(crate) fn cut_at_other_labels(value: &str, except: Label) -> &str {
    let stops: Vec<Label> = Label::ALL
        .into_iter()
        .filter(|label| label.is_structural() && *label != except)
        .collect();
    cut_at_labels(value, &stops)
}

/// Repeatedly removes a leading field label and its separators.
pub(crate) fn strip_label_prefix(value: &str) -> String {
    let mut current = clean(value);
    for _ in 0..4 {
        let folded = fold(&current);
        let end = PATTERNS
            .iter()
            .filter(|p| p.label.is_structural())
            .filter_map(|p| p.anchored.find(&folded))
            .map(|m| m.end())
            .max();
        match end {
            Some(end) => current = clean(&current[end..]),
            None => break,
        }
    }
    current
}

//! Per-field strategies. Each function reads the trimmed, non-empty lines
//! of one OCR result and returns the raw value it found, if any.

use std::sync::LazyLock;

use regex::Regex;

use super::date::{find_date, repair_digits};
use super::labels::{
    after_label, clean, contains_other_label, cut_at_labels, cut_at_other_labels, fold,
    is_label_line, label_end, words_pattern, Label,
};

/// Lines read past a label when its own line carries no value.
const LOOKAHEAD_LINES: usize = 2;
const MAX_ADDRESS_LINES: usize = 3;

static SIXTEEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\d])(\d{16})(?:[^\d]|$)").unwrap());
static RT_RW_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d/\-])(\d{1,3})\s*[/\-]\s*(\d{1,3})(?:[^\d/\-]|$)").unwrap()
});
static FOUR_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Words that end a name captured from a run-on line.
static NAME_CUTOFF: LazyLock<Regex> = LazyLock::new(|| {
    let words = ["TEMPAT", "TGL", "LAHIR", "ALAMAT", "JENIS", "NIK", "TTL"]
        .iter()
        .map(|w| words_pattern(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{words})")).unwrap()
});

static FEMALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{}|{})",
        words_pattern("PEREMPUAN"),
        words_pattern("WANITA")
    ))
    .unwrap()
});
static MALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{}|{}|{})",
        words_pattern("LELAKI"),
        words_pattern("LAKI"),
        words_pattern("PRIA")
    ))
    .unwrap()
});

fn is_digit_line(line: &str) -> bool {
    let mut digits = 0;
    for c in line.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            digits += 1;
        } else if !matches!(c, '/' | '-' | '.' | ':') {
            return false;
        }
    }
    digits > 0
}

/// First of the next [`LOOKAHEAD_LINES`] lines that is neither digits nor a
/// label line and that `accept` approves.
fn lookahead(lines: &[&str], index: usize, accept: impl Fn(&str) -> bool) -> Option<String> {
    lines
        .iter()
        .skip(index + 1)
        .take(LOOKAHEAD_LINES)
        .filter(|line| !is_digit_line(line) && !is_label_line(line))
        .map(|line| clean(line))
        .find(|candidate| accept(candidate))
}

/// Label-prefix strategy shared by the administrative and demographic
/// fields: value on the label line (cut at `stops`), else look ahead.
pub(super) fn labelled(lines: &[&str], label: Label, stops: &[Label]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, label) else {
            continue;
        };
        let value = clean(cut_at_labels(rest, stops));
        if !value.is_empty() {
            return Some(value);
        }
        if let Some(value) = lookahead(lines, i, |c| !c.is_empty()) {
            return Some(clean(cut_at_labels(&value, stops)));
        }
    }
    None
}

fn sixteen_digits(text: &str) -> Option<String> {
    SIXTEEN_DIGITS
        .captures(text)
        .map(|caps| caps[1].to_string())
}

pub(super) fn nik(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::Nik) else {
            continue;
        };
        let mut candidate = rest.to_string();
        if !candidate.chars().any(|c| c.is_ascii_digit()) {
            if let Some(next) = lines.get(i + 1) {
                candidate = next.to_string();
            }
        }
        let repaired = repair_digits(&candidate);
        let compact: String = repaired.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(found) = sixteen_digits(&repaired).or_else(|| sixteen_digits(&compact)) {
            return Some(found);
        }
    }

    lines.iter().find_map(|line| sixteen_digits(line))
}

fn cut_name(value: &str) -> String {
    let folded = fold(value);
    let end = NAME_CUTOFF
        .find(&folded)
        .map(|m| m.start())
        .unwrap_or(value.len());
    clean(&value[..end])
}

fn plausible_name(candidate: &str) -> bool {
    candidate.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && !candidate.chars().any(|c| c.is_ascii_digit())
        && !candidate.contains('/')
        && !candidate.contains(':')
        && !contains_other_label(candidate, Label::Nama)
}

pub(super) fn nama(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::Nama) else {
            continue;
        };
        let value = cut_name(rest);
        if !value.is_empty() && plausible_name(&value) {
            return Some(value);
        }
        let found = lookahead(lines, i, |c| plausible_name(&cut_name(c))).map(|c| cut_name(&c));
        if found.is_some() {
            return found;
        }
    }

    // No usable label: the name is printed right below the NIK.
    let anchor = lines
        .iter()
        .position(|line| sixteen_digits(&line.replace(' ', "")).is_some())?;
    let next = lines
        .iter()
        .skip(anchor + 1)
        .find(|line| !is_label_line(line) && !is_digit_line(line))?;
    let value = cut_name(next);
    plausible_name(&value).then_some(value)
}

fn split_birth(value: &str) -> (String, Option<String>) {
    match find_date(value) {
        Some(date) => {
            let place = format!("{} {}", &value[..date.start], &value[date.end..]);
            (clean(&place), date.iso)
        }
        None => (value.to_string(), None),
    }
}

fn has_date(value: &str) -> bool {
    find_date(value).is_some_and(|date| date.iso.is_some())
}

/// Birth place and the normalized date of the TEMPAT/TGL LAHIR label.
/// When the label line has no date, the following lines are searched for
/// one, so stacked labels and a date printed on its own line still resolve.
pub(super) fn birth(lines: &[&str]) -> Option<(String, Option<String>)> {
    const STOPS: &[Label] = &[Label::JenisKelamin, Label::GolDarah, Label::Alamat];

    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::TempatTglLahir) else {
            continue;
        };
        let value = clean(cut_at_labels(rest, STOPS));
        if has_date(&value) {
            return Some(split_birth(&value));
        }

        let dated = lines
            .iter()
            .skip(i + 1)
            .take(LOOKAHEAD_LINES)
            .filter(|next| !is_label_line(next))
            .map(|next| clean(cut_at_labels(next, STOPS)))
            .find(|candidate| has_date(candidate));
        if let Some(candidate) = dated {
            let (place, date) = split_birth(&candidate);
            let place = if value.is_empty() { place } else { value };
            return Some((place, date));
        }
        if !value.is_empty() {
            return Some((value, None));
        }
        if let Some(place) = lookahead(lines, i, |c| !c.is_empty()) {
            return Some((clean(cut_at_labels(&place, STOPS)), None));
        }
    }
    None
}

/// Maps free text onto the closed gender vocabulary.
pub(crate) fn gender_of(text: &str) -> Option<&'static str> {
    let folded = fold(text);
    if FEMALE.is_match(&folded) {
        Some("Perempuan")
    } else if MALE.is_match(&folded) {
        Some("Laki-laki")
    } else {
        None
    }
}

pub(super) fn jenis_kelamin(lines: &[&str], text: &str) -> Option<&'static str> {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::JenisKelamin) else {
            continue;
        };
        if let Some(gender) = gender_of(rest) {
            return Some(gender);
        }
        if let Some(gender) = lines.get(i + 1).and_then(|next| gender_of(next)) {
            return Some(gender);
        }
    }
    gender_of(text)
}

fn rt_rw_in(text: &str) -> Option<(String, String)> {
    let repaired = repair_digits(text);
    if FOUR_DIGITS.is_match(&repaired) {
        return None;
    }
    RT_RW_PAIR
        .captures(&repaired)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// RT/RW pair plus the index of the line it was read from.
pub(super) fn rt_rw(lines: &[&str]) -> Option<(String, String, usize)> {
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::RtRw) else {
            continue;
        };
        if let Some((rt, rw)) = rt_rw_in(rest) {
            return Some((rt, rw, i));
        }
        if let Some((rt, rw)) = lines.get(i + 1).and_then(|next| rt_rw_in(next)) {
            return Some((rt, rw, i + 1));
        }
    }

    lines.iter().enumerate().find_map(|(i, line)| {
        if is_label_line(line) {
            return None;
        }
        rt_rw_in(line).map(|(rt, rw)| (rt, rw, i))
    })
}

fn plausible_address_line(line: &str) -> bool {
    !is_label_line(line)
        && !is_digit_line(line)
        && sixteen_digits(&line.replace(' ', "")).is_none()
        && line.chars().filter(|c| c.is_alphabetic()).count() >= 2
}

pub(super) fn alamat(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let Some(end) = label_end(line, Label::Alamat) else {
            continue;
        };
        let mut parts = Vec::new();
        let first = clean(cut_at_other_labels(&line[end..], Label::Alamat));
        if !first.is_empty() {
            parts.push(first);
        }
        for next in lines.iter().skip(i + 1) {
            if parts.len() >= MAX_ADDRESS_LINES || is_label_line(next) || is_digit_line(next) {
                break;
            }
            let part = clean(cut_at_other_labels(next, Label::Alamat));
            if part.is_empty() {
                break;
            }
            parts.push(part);
        }
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }
    }

    // Unlabelled: the address sits just above the standalone RT/RW line.
    let (_, _, index) = rt_rw(lines)?;
    lines[..index]
        .iter()
        .rev()
        .take(LOOKAHEAD_LINES)
        .find(|line| plausible_address_line(line))
        .map(|line| clean(line))
}

/// Regency, or the city header when the card belongs to a city.
pub(super) fn kabupaten(lines: &[&str]) -> Option<String> {
    const STOPS: &[Label] = &[Label::Provinsi, Label::Kecamatan, Label::Nik];

    for line in lines {
        if let Some(rest) = after_label(line, Label::Kabupaten) {
            let value = clean(cut_at_labels(rest, STOPS));
            if !value.is_empty() {
                return Some(value);
            }
        }
        if label_end(line, Label::Kota).is_some() {
            let value = clean(cut_at_labels(line, STOPS));
            if value.split_whitespace().count() > 1 {
                return Some(value);
            }
        }
    }
    None
}

/// Citizenship printed after its label, on the same line or the next one.
pub(super) fn kewarganegaraan(lines: &[&str]) -> Option<&'static str> {
    const STOPS: &[Label] = &[Label::BerlakuHingga, Label::Pekerjaan];
    let known = |value: &str| Some(super::citizenship(value)).filter(|c| !c.is_empty());

    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = after_label(line, Label::Kewarganegaraan) else {
            continue;
        };
        if let Some(citizenship) = known(cut_at_labels(rest, STOPS)) {
            return Some(citizenship);
        }
        if let Some(citizenship) = lines
            .get(i + 1)
            .and_then(|next| known(cut_at_labels(next, STOPS)))
        {
            return Some(citizenship);
        }
    }
    None
}

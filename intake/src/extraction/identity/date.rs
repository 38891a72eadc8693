//! Birth-date recognition inside OCR'd "place, date" values.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Two-digit years at or above this resolve to the 1900s, below it to the 2000s.
pub const PIVOT_YEAR: u32 = 30;

static DATE_SEPARATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,2})\s*[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{4}|\d{2})(?:[^\d]|$)")
        .unwrap()
});
static DATE_SPACED_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,2})\s+(\d{1,2})\s+(\d{4})(?:[^\d]|$)").unwrap()
});
static DATE_SPACED_SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{2})\s+(\d{2})\s+(\d{2})(?:[^\d]|$)").unwrap()
});
static DATE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{4})\s*[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{1,2})(?:[^\d]|$)").unwrap()
});

/// A date located in a value. `start..end` is the byte span of the date
/// text; `iso` is `None` when the digits do not form a real calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub start: usize,
    pub end: usize,
    pub iso: Option<String>,
}

fn digit_for(c: char) -> Option<char> {
    match c {
        'O' | 'o' | 'D' | 'Q' => Some('0'),
        'I' | 'l' | 'i' | '|' | '!' => Some('1'),
        'Z' | 'z' => Some('2'),
        'S' | 's' => Some('5'),
        'G' | 'b' => Some('6'),
        'B' => Some('8'),
        _ => None,
    }
}

/// Replaces letters OCR commonly reads in place of digits, but only where
/// they touch a real digit, so words around a number are left alone.
/// Byte offsets are preserved.
pub fn repair_digits(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    loop {
        let mut changed = false;
        for i in 0..chars.len() {
            let Some(digit) = digit_for(chars[i]) else {
                continue;
            };
            let before = i > 0 && chars[i - 1].is_ascii_digit();
            let after = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
            if before || after {
                chars[i] = digit;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    chars.into_iter().collect()
}

fn expand_year(year: &str) -> Option<i32> {
    let value: u32 = year.parse().ok()?;
    match year.len() {
        2 if value >= PIVOT_YEAR => Some(1900 + value as i32),
        2 => Some(2000 + value as i32),
        4 => Some(value as i32),
        _ => None,
    }
}

/// Day/month/year digits to ISO `yyyy-mm-dd`, rejecting impossible dates.
pub fn to_iso(day: &str, month: &str, year: &str) -> Option<String> {
    let year = expand_year(year)?;
    if !(1900..=2100).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn span(caps: &regex::Captures<'_>) -> Option<(usize, usize)> {
    Some((caps.get(1)?.start(), caps.get(3)?.end()))
}

/// Finds the first date in `value` (`dd-mm-yyyy`, `dd/mm/yy`, `dd mm yyyy`,
/// `yyyy-mm-dd`, ...), tolerating OCR letter/digit confusions.
pub fn find_date(value: &str) -> Option<DateMatch> {
    let repaired = repair_digits(value);

    if let Some(caps) = DATE_ISO.captures(&repaired) {
        let (start, end) = span(&caps)?;
        return Some(DateMatch {
            start,
            end,
            iso: to_iso(&caps[3], &caps[2], &caps[1]),
        });
    }

    for pattern in [&DATE_SEPARATED, &DATE_SPACED_LONG, &DATE_SPACED_SHORT] {
        if let Some(caps) = pattern.captures(&repaired) {
            let (start, end) = span(&caps)?;
            return Some(DateMatch {
                start,
                end,
                iso: to_iso(&caps[1], &caps[2], &caps[3]),
            });
        }
    }

    None
}

/// Normalizes a standalone date value to ISO, or `None` if it is not one.
pub fn normalize_date(value: &str) -> Option<String> {
    find_date(value).and_then(|m| m.iso)
}

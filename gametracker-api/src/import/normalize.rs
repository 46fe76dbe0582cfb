//! Field normalizers for third-party CSV exports
//!
//! Export files mix free-text durations ("10-12 Hours", "8½ Hours",
//! "Varies"), ratings on either a 0-10 or 0-100 scale with comma or dot
//! decimal separators, and completion dates in several formats. Each
//! normalizer is total: bad input degrades to a default instead of failing
//! the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize a duration text to hours
///
/// Strips the words "Hours"/"Hour", replaces "½" with ".5" and an en-dash
/// with a hyphen. "Varies", "N/A" and empty input mean 0. A "a-b" range
/// yields the mean of the bounds rounded to 2 decimals; anything else is
/// parsed as a plain decimal, with 0 as the unparsable fallback.
pub fn parse_hours(raw: &str) -> f64 {
    let cleaned = strip_word_ci(raw, "hours");
    let cleaned = strip_word_ci(&cleaned, "hour");
    let cleaned = cleaned.replace('½', ".5").replace('–', "-");
    let cleaned = cleaned.trim();

    if cleaned.is_empty()
        || cleaned.eq_ignore_ascii_case("varies")
        || cleaned.eq_ignore_ascii_case("n/a")
    {
        return 0.0;
    }

    if cleaned.contains('-') {
        let parts: Vec<&str> = cleaned.split('-').filter(|p| !p.is_empty()).collect();
        if parts.len() == 2 {
            if let (Ok(a), Ok(b)) = (
                parts[0].trim().parse::<f64>(),
                parts[1].trim().parse::<f64>(),
            ) {
                return round2((a + b) / 2.0);
            }
        }
    }

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Parse a rating, tolerating comma decimal separators
///
/// Values above 10 are assumed to be on a 0-100 scale and divided by 10,
/// rounded to 2 decimals. An input of exactly 10 is kept as-is.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value > 10.0 {
        Some(round2(value / 10.0))
    } else {
        Some(value)
    }
}

/// Parse a completion date from the formats seen in export files
///
/// Trims surrounding quotes and whitespace; empty input and the literal
/// "--" mean absent. Tries ISO date/datetime first, then month-first, then
/// day-first forms.
pub fn parse_completion_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = raw.trim().trim_matches('"').trim();
    if cleaned.is_empty() || cleaned == "--" {
        return None;
    }

    const DATETIME_FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

/// Normalize a CSV header name for tolerant matching
///
/// "Main Story", " main story " and "MainStory" all map to "mainstory".
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Remove every occurrence of `word`, ASCII-case-insensitively
fn strip_word_ci(s: &str, word: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let word: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if i + word.len() <= chars.len()
            && chars[i..i + word.len()]
                .iter()
                .zip(&word)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
        {
            i += word.len();
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

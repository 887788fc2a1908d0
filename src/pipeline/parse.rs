// src/pipeline/parse.rs
//
// Null-safe conversion of raw field values to typed values. The raw exports
// mix JSON numbers with localized strings ("Punteggio di 8,0", "150 m dal
// centro", "gennaio 2025"), so every parser here accepts garbage and returns
// `None` as the "missing" sentinel instead of failing. All functions are
// pure; loaders decide whether a missing value rejects the row.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Matches integers written with `.` as a thousands separator ("1.234").
static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(\.\d{3})+$").expect("static regex"));

/// Extracts the first number embedded in free text.
static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.\d+|[-+]?\d+").expect("static regex"));

/// Datetime formats tried in order; first match wins.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Date-only formats tried after the datetime formats.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Italian month names as they appear in review exports ("gennaio 2025").
const ITALIAN_MONTHS: &[(&str, u32)] = &[
    ("gennaio", 1),
    ("febbraio", 2),
    ("marzo", 3),
    ("aprile", 4),
    ("maggio", 5),
    ("giugno", 6),
    ("luglio", 7),
    ("agosto", 8),
    ("settembre", 9),
    ("ottobre", 10),
    ("novembre", 11),
    ("dicembre", 12),
];

/// Safely parse an integer. Accepts JSON numbers, integral floats and
/// numeric strings (whitespace and thousands separators stripped).
/// Returns `None` for empty or invalid input.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            let cleaned = if THOUSANDS.is_match(&cleaned) {
                cleaned.replace('.', "")
            } else {
                cleaned
            };
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Safely parse a float. Strips thousands separators ("1.250,00" -> 1250.0),
/// handles `,` as a decimal separator, strips the Booking score prefix
/// ("Punteggio di 8,0") and extracts the first number from mixed text
/// ("150 m dal centro" -> 150.0). Returns `None` if nothing numeric is found.
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.replace("Punteggio di ", "");
            let cleaned = cleaned.trim();
            // A comma marks the decimal point in the raw exports, so any
            // dots before it group thousands and must go first.
            let cleaned = if cleaned.contains(',') {
                cleaned.replace('.', "").replace(',', ".")
            } else if THOUSANDS.is_match(cleaned) {
                cleaned.replace('.', "")
            } else {
                cleaned.to_string()
            };
            FIRST_NUMBER
                .find(&cleaned)
                .and_then(|m| m.as_str().parse().ok())
        }
        _ => None,
    }
}

/// Parse a date or datetime string against an ordered list of known formats,
/// then Italian month-year names ("gennaio 2025" -> 2025-01-01 00:00).
/// Returns `None` if no format matches.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    parse_italian_month_year(raw)
}

fn parse_italian_month_year(raw: &str) -> Option<NaiveDateTime> {
    let lowered = raw.to_lowercase();
    let mut parts = lowered.split_whitespace();
    let month_name = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = ITALIAN_MONTHS
        .iter()
        .find(|(name, _)| *name == month_name)
        .map(|(_, m)| *m)?;
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Returns the first present, non-null value among the given field aliases.
/// Raw exports mix Italian and English column names, so every loader looks a
/// field up under all of its known spellings.
pub fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = record.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// First non-empty trimmed string among the given field aliases.
pub fn str_field(record: &Value, keys: &[&str]) -> Option<String> {
    field(record, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn int_field(record: &Value, keys: &[&str]) -> Option<i64> {
    field(record, keys).and_then(parse_int)
}

pub fn float_field(record: &Value, keys: &[&str]) -> Option<f64> {
    field(record, keys).and_then(parse_float)
}

pub fn date_field(record: &Value, keys: &[&str]) -> Option<NaiveDateTime> {
    field(record, keys).and_then(parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_int_from_number_and_string() {
        assert_eq!(parse_int(&json!(42)), Some(42));
        assert_eq!(parse_int(&json!(42.0)), Some(42));
        assert_eq!(parse_int(&json!(" 42 ")), Some(42));
        assert_eq!(parse_int(&json!("1.234")), Some(1234));
    }

    #[test]
    fn test_parse_int_missing_sentinel() {
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!("n/a")), None);
        assert_eq!(parse_int(&json!(null)), None);
        assert_eq!(parse_int(&json!(8.5)), None);
    }

    #[test]
    fn test_parse_float_locale_quirks() {
        assert_eq!(parse_float(&json!("8,0")), Some(8.0));
        assert_eq!(parse_float(&json!("Punteggio di 8,5")), Some(8.5));
        assert_eq!(parse_float(&json!("150 m dal centro")), Some(150.0));
        assert_eq!(parse_float(&json!(9.2)), Some(9.2));
    }

    #[test]
    fn test_parse_float_thousands_separators() {
        assert_eq!(parse_float(&json!("1.250,00")), Some(1250.0));
        assert_eq!(parse_float(&json!("1.234")), Some(1234.0));
        assert_eq!(parse_float(&json!("12.345.678,90")), Some(12_345_678.9));
        // A lone dot without a decimal comma stays a decimal point.
        assert_eq!(parse_float(&json!("8.5")), Some(8.5));
    }

    #[test]
    fn test_parse_float_missing_sentinel() {
        assert_eq!(parse_float(&json!("")), None);
        assert_eq!(parse_float(&json!("dal centro")), None);
        assert_eq!(parse_float(&json!(null)), None);
        assert_eq!(parse_float(&json!(true)), None);
    }

    #[test]
    fn test_parse_date_ordered_formats() {
        let iso = parse_date(&json!("2025-01-15")).expect("ISO date should parse");
        assert_eq!(iso.format("%Y-%m-%d %H:%M").to_string(), "2025-01-15 00:00");

        let with_time = parse_date(&json!("2025-01-15T08:30:00")).expect("datetime should parse");
        assert_eq!(with_time.format("%H:%M").to_string(), "08:30");

        let european = parse_date(&json!("15/01/2025")).expect("d/m/Y should parse");
        assert_eq!(european.format("%Y-%m-%d").to_string(), "2025-01-15");
    }

    #[test]
    fn test_parse_date_italian_month_year() {
        let dt = parse_date(&json!("gennaio 2025")).expect("Italian month should parse");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2025-01-01");
        let dt = parse_date(&json!("Dicembre 2024")).expect("case-insensitive month");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-12-01");
    }

    #[test]
    fn test_parse_date_garbage() {
        assert_eq!(parse_date(&json!("soon")), None);
        assert_eq!(parse_date(&json!("")), None);
        assert_eq!(parse_date(&json!(20250115)), None);
        assert_eq!(parse_date(&json!("frittata 2025")), None);
    }

    #[test]
    fn test_field_alias_lookup() {
        let record = json!({"Città": "Milan", "Stelle": "4", "Voto": null});
        assert_eq!(
            str_field(&record, &["city", "Città"]),
            Some("Milan".to_string())
        );
        assert_eq!(int_field(&record, &["stars", "Stelle"]), Some(4));
        // Null values are treated as absent.
        assert_eq!(field(&record, &["Voto"]), None);
        assert_eq!(str_field(&record, &["missing"]), None);
    }
}

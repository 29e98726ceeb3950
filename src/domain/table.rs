// ============================================================
// TABLE TYPES
// ============================================================
// Row-oriented view of one spreadsheet and the scalar helpers shared by the
// loader, the row filter and the report assembler

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// One record keyed by column name, in schema order.
pub type Row = Map<String, Value>;

/// Text markers that spreadsheet tooling writes for "no value".
static NOT_AVAILABLE_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

static NUMERIC_TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+([.,]\d*)?|[.,]\d+)([eE][+-]?\d+)?\s*%?$").unwrap()
});

const BLANK_MARKERS: [&str; 5] = ["", "-", "—", "na", "n/a"];

// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// An ordered set of rows sharing one column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `index`, `Null` when absent.
    pub fn cell(&self, index: usize, column: &str) -> &Value {
        self.rows
            .get(index)
            .and_then(|row| row.get(column))
            .unwrap_or(&Value::Null)
    }
}

/// Converts a float into the JSON value the API exposes: non-finite values
/// become `null`, integral values become integers.
pub fn number_value(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Maps a text cell to `null` when it is a not-available marker.
pub fn text_value(raw: &str) -> Value {
    if NOT_AVAILABLE_MARKERS.contains(raw.trim()) {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

/// Null, empty, a lone dash or em-dash, and "na"/"n/a" in any case.
pub fn is_blank_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => BLANK_MARKERS.contains(&text.trim().to_lowercase().as_str()),
        _ => false,
    }
}

/// Parses numbers and numeric text; text may use a decimal comma and a
/// trailing percent sign. "nan" and "inf" spellings are rejected.
pub fn parse_number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == "-" || trimmed == "—" {
                return None;
            }
            trimmed
                .replace('%', "")
                .replace(',', ".")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
        }
        _ => None,
    }
}

pub fn is_number_like(value: &Value) -> bool {
    parse_number_like(value).is_some()
}

/// True for text that reads as a plain number, with an optional decimal
/// comma, exponent or trailing percent sign.
pub fn looks_numeric(text: &str) -> bool {
    NUMERIC_TEXT_PATTERN.is_match(text.trim())
}

/// JSON truthiness: `false`, `0`, `""`, `[]`, `{}` and `null` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Text shown for a cell in the report; absent and null render as `-`.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_value_sanitizes_sentinels() {
        assert_eq!(number_value(f64::NAN), Value::Null);
        assert_eq!(number_value(f64::INFINITY), Value::Null);
        assert_eq!(number_value(f64::NEG_INFINITY), Value::Null);
        assert_eq!(number_value(2008.0), json!(2008));
        assert_eq!(number_value(0.125), json!(0.125));
    }

    #[test]
    fn test_text_value_maps_not_available_markers() {
        assert_eq!(text_value("NA"), Value::Null);
        assert_eq!(text_value("#N/A"), Value::Null);
        assert_eq!(text_value("  "), Value::Null);
        assert_eq!(text_value("Soja"), json!("Soja"));
    }

    #[test]
    fn test_blank_like() {
        for blank in [json!(null), json!(""), json!(" - "), json!("—"), json!("NA"), json!("n/A")] {
            assert!(is_blank_like(&blank), "{blank} should be blank");
        }
        assert!(!is_blank_like(&json!("1.5")));
        assert!(!is_blank_like(&json!(0)));
    }

    #[test]
    fn test_number_like_accepts_comma_and_percent() {
        assert_eq!(parse_number_like(&json!("12,5%")), Some(12.5));
        assert_eq!(parse_number_like(&json!(3)), Some(3.0));
        assert_eq!(parse_number_like(&json!("—")), None);
        assert_eq!(parse_number_like(&json!("abc")), None);
        assert_eq!(parse_number_like(&json!("NaN")), None);
        assert_eq!(parse_number_like(&json!(null)), None);
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("0,05"));
        assert!(looks_numeric("-1.5e-3"));
        assert!(looks_numeric("45 %"));
        assert!(!looks_numeric("nan"));
        assert!(!looks_numeric("Soja"));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("sim")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(None), "-");
        assert_eq!(display_value(Some(&json!(null))), "-");
        assert_eq!(display_value(Some(&json!(0.05))), "0.05");
        assert_eq!(display_value(Some(&json!("Sul"))), "Sul");
    }
}

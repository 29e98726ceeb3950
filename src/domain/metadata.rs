use serde::Serialize;
use serde_json::Value;

use super::table::{number_value, parse_number_like, text_value};

pub const ADI_LABEL: &str = "ADI (mg/kg bw/day)";
pub const BODY_WEIGHT_LABEL: &str = "bw (kg)";
pub const IDMT_LABEL: &str = "IDMT";
pub const PERCENT_ADI_LABEL: &str = "%ADI";

const DEFAULT_ADI: f64 = 0.05;
const DEFAULT_BODY_WEIGHT: f64 = 70.0;

/// Raw label/value rows above the Mexico table, kept cell for cell so the
/// block can be written back unchanged.
pub type MetadataBlock = Vec<Vec<Value>>;

/// Scalars read from the Mexico metadata block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MexicoMetadata {
    pub adi: Value,
    pub bw: Value,
    pub idmt: Value,
    pub percent_adi: Value,
}

impl MexicoMetadata {
    pub fn from_block(block: &MetadataBlock) -> Self {
        Self {
            adi: numeric_or(block, ADI_LABEL, DEFAULT_ADI),
            bw: numeric_or(block, BODY_WEIGHT_LABEL, DEFAULT_BODY_WEIGHT),
            idmt: scalar(block, IDMT_LABEL),
            percent_adi: scalar(block, PERCENT_ADI_LABEL),
        }
    }
}

/// Value next to `label` in column A, if the label is present.
fn lookup<'a>(block: &'a MetadataBlock, label: &str) -> Option<&'a Value> {
    block.iter().find_map(|row| {
        let key = match row.first()? {
            Value::String(text) => text.trim().to_string(),
            other => other.to_string(),
        };
        if key == label {
            Some(row.get(1).unwrap_or(&Value::Null))
        } else {
            None
        }
    })
}

fn numeric_or(block: &MetadataBlock, label: &str, default: f64) -> Value {
    match lookup(block, label) {
        None => number_value(default),
        Some(value) => parse_number_like(value)
            .map(number_value)
            .unwrap_or(Value::Null),
    }
}

fn scalar(block: &MetadataBlock, label: &str) -> Value {
    match lookup(block, label) {
        Some(Value::Number(number)) => number.as_f64().map(number_value).unwrap_or(Value::Null),
        Some(Value::String(text)) => text_value(text),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

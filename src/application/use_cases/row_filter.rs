//! Decides which payload rows the user actually filled in.
//!
//! A row counts as user-edited when at least one editable field is not
//! blank-like. The acute calculator adds a stricter tier that only accepts
//! values which arrived as JSON text, since typed-in values reach the server
//! as strings while prefilled ones arrive as numbers. The strict tier is a
//! heuristic: once a value has crossed JSON there is no reliable way to
//! tell manual entry from programmatic population.

use serde_json::Value;

use crate::domain::table::{is_blank_like, Row};

pub const ACUTE_EDITABLE_FIELDS: [&str; 3] = ["LMR (mg/kg)", "HR/MCR (mg/kg)", "MREC/STMR (mg/kg)"];

pub const CHRONIC_EDITABLE_FIELDS: [&str; 4] = [
    "LMR (mg_kg)",
    "LMR (mg/kg)",
    "MREC_STMR (mg_kg)",
    "MREC_STMR (mg/kg)",
];

pub const MEXICO_EDITABLE_FIELDS: [&str; 2] = ["LMR (mg/kg)", "R (mg/kg)"];

pub fn has_user_value(row: &Row, editable_fields: &[&str]) -> bool {
    editable_fields
        .iter()
        .any(|field| row.get(*field).map(|value| !is_blank_like(value)).unwrap_or(false))
}

pub fn has_typed_text(row: &Row, editable_fields: &[&str]) -> bool {
    editable_fields.iter().any(|field| match row.get(*field) {
        Some(value @ Value::String(_)) => !is_blank_like(value),
        _ => false,
    })
}

/// Rows with at least one non-blank editable field.
pub fn user_filled_rows(rows: &[Row], editable_fields: &[&str]) -> Vec<Row> {
    rows.iter()
        .filter(|row| has_user_value(row, editable_fields))
        .cloned()
        .collect()
}

/// Rows with at least one editable field that arrived as non-blank text.
pub fn user_typed_rows(rows: &[Row], editable_fields: &[&str]) -> Vec<Row> {
    rows.iter()
        .filter(|row| has_typed_text(row, editable_fields))
        .cloned()
        .collect()
}

/// Acute rows for the report: the typed-text tier when it finds anything,
/// otherwise every user-filled row.
pub fn acute_report_rows(rows: &[Row]) -> Vec<Row> {
    let filled = user_filled_rows(rows, &ACUTE_EDITABLE_FIELDS);
    let typed = user_typed_rows(&filled, &ACUTE_EDITABLE_FIELDS);
    if typed.is_empty() {
        filled
    } else {
        typed
    }
}

pub fn chronic_report_rows(rows: &[Row]) -> Vec<Row> {
    user_filled_rows(rows, &CHRONIC_EDITABLE_FIELDS)
}

pub fn mexico_report_rows(rows: &[Row]) -> Vec<Row> {
    user_filled_rows(rows, &MEXICO_EDITABLE_FIELDS)
}

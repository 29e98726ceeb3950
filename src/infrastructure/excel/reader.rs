use std::path::Path;

use calamine::{open_workbook, Data, DataType, Range, Reader, Xlsx};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::dataset::DatasetSchema;
use crate::domain::error::{AppError, Result, SchemaDirection};
use crate::domain::metadata::MetadataBlock;
use crate::domain::table::{number_value, text_value, Row, Table};

/// Table and metadata block read from one dataset workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSheet {
    pub table: Table,
    pub metadata: MetadataBlock,
}

/// Reads the first worksheet of `path` against `schema`.
///
/// Only the schema's columns are kept, in schema order. Not-available
/// markers, spreadsheet error cells and non-finite numbers become `null`.
/// Rows whose kept cells are all empty are dropped.
pub fn load_sheet(path: &Path, schema: &DatasetSchema) -> Result<LoadedSheet> {
    if !path.exists() {
        return Err(AppError::NotFound(path.display().to_string()));
    }

    let range = read_first_sheet(path)?;
    let layout = schema.layout;

    let header = header_names(&range, layout.header_row);
    let missing = schema.missing_columns(header.iter().map(String::as_str));
    if !missing.is_empty() {
        return Err(AppError::schema(SchemaDirection::Load, missing));
    }

    let columns = schema.effective_columns(header.iter().map(String::as_str));
    let positions: Vec<(String, u32)> = columns
        .iter()
        .filter_map(|column| {
            header
                .iter()
                .position(|name| name == column)
                .map(|index| (column.clone(), index as u32))
        })
        .collect();

    let mut rows = Vec::new();
    if let Some((last_row, _)) = range.end() {
        for sheet_row in (layout.header_row + 1)..=last_row {
            let mut row = Row::new();
            for (column, sheet_col) in &positions {
                let value = range
                    .get_value((sheet_row, *sheet_col))
                    .map(cell_value)
                    .unwrap_or(Value::Null);
                row.insert(column.clone(), value);
            }
            if row.values().all(Value::is_null) {
                debug!(row = sheet_row, "Skipping empty spreadsheet row");
                continue;
            }
            rows.push(row);
        }
    }

    let metadata = read_metadata_block(&range, layout.metadata_rows);

    info!(
        path = %path.display(),
        rows = rows.len(),
        columns = columns.len(),
        "Loaded dataset sheet"
    );

    Ok(LoadedSheet {
        table: Table::new(columns, rows),
        metadata,
    })
}

/// Reads just the leading metadata rows of `path`, unchanged.
pub fn load_metadata_block(path: &Path, rows: u32) -> Result<MetadataBlock> {
    if rows == 0 {
        return Ok(Vec::new());
    }
    if !path.exists() {
        return Err(AppError::NotFound(path.display().to_string()));
    }
    let range = read_first_sheet(path)?;
    Ok(read_metadata_block(&range, rows))
}

fn read_first_sheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| AppError::ReadError(format!("{}: {}", path.display(), e)))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ReadError(format!("{}: no worksheet found", path.display())))?
        .map_err(|e| AppError::ReadError(format!("{}: {}", path.display(), e)))
}

/// Trimmed header labels of `header_row`, indexed by absolute column.
fn header_names(range: &Range<Data>, header_row: u32) -> Vec<String> {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_col)
        .map(|col| match range.get_value((header_row, col)) {
            None | Some(Data::Empty) => String::new(),
            Some(Data::String(text)) => text.trim().to_string(),
            Some(other) => match cell_value(other) {
                Value::Null => String::new(),
                Value::String(text) => text.trim().to_string(),
                value => value.to_string(),
            },
        })
        .collect()
}

fn read_metadata_block(range: &Range<Data>, rows: u32) -> MetadataBlock {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..rows)
        .map(|row| {
            let mut cells: Vec<Value> = (0..=last_col)
                .map(|col| range.get_value((row, col)).map(raw_cell_value).unwrap_or(Value::Null))
                .collect();
            while cells.last().map(Value::is_null).unwrap_or(false) {
                cells.pop();
            }
            cells
        })
        .collect()
}

/// Sanitized JSON value of a data cell.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::String(text) => text_value(text),
        other => raw_cell_value(other),
    }
}

/// JSON value of a cell with text kept verbatim.
fn raw_cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(value) => Value::from(*value),
        Data::Float(value) => number_value(*value),
        Data::Bool(flag) => Value::Bool(*flag),
        Data::String(text) => Value::String(text.clone()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Value::String(text.clone()),
        Data::DateTime(_) => cell.as_f64().map(number_value).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{CHRONIC_SCHEMA, MEXICO_SCHEMA};
    use rust_xlsxwriter::Workbook;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_sheet(dir: &TempDir, name: &str, rows: &[Vec<Value>]) -> PathBuf {
        let path = dir.path().join(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    Value::String(text) => {
                        worksheet.write_string(r, c, text.as_str()).unwrap();
                    }
                    Value::Number(number) => {
                        worksheet.write_number(r, c, number.as_f64().unwrap()).unwrap();
                    }
                    _ => {}
                }
            }
        }
        workbook.save(&path).unwrap();
        path
    }

    fn chronic_header() -> Vec<Value> {
        CHRONIC_SCHEMA.required_columns().map(|c| json!(c)).collect()
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_sheet(&dir.path().join("absent.xlsx"), &CHRONIC_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_unreadable_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();
        let err = load_sheet(&path, &CHRONIC_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::ReadError(_)));
    }

    #[test]
    fn test_missing_columns_are_listed_exactly() {
        let dir = TempDir::new().unwrap();
        let mut header = chronic_header();
        header.retain(|name| name != "Região" && name != "PC (kg)");
        header.insert(0, json!("Extra"));
        header.reverse();
        let path = write_sheet(&dir, "chronic.xlsx", &[header]);

        let err = load_sheet(&path, &CHRONIC_SCHEMA).unwrap_err();

        match err {
            AppError::SchemaError { direction, missing } => {
                assert_eq!(direction, SchemaDirection::Load);
                assert_eq!(missing, vec!["Região", "PC (kg)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_keeps_schema_columns_in_order_and_sanitizes() {
        let dir = TempDir::new().unwrap();
        let mut header = chronic_header();
        header.reverse();
        header.push(json!(" Observação "));
        let mut data: Vec<Value> = vec![json!("NA"); header.len()];
        // reversed: 0 is "PC (kg)", 9 "Região", 10 "ANO_POF", 11 "Cultivo"
        data[0] = json!(61.23456);
        data[11] = json!("Soja");
        data[12] = json!("drop me");
        data[10] = json!(2008);
        let mut extra_only = vec![Value::Null; 12];
        extra_only.push(json!("x"));
        let path = write_sheet(&dir, "chronic.xlsx", &[header, data, vec![], extra_only]);

        let loaded = load_sheet(&path, &CHRONIC_SCHEMA).unwrap();

        let expected: Vec<String> = CHRONIC_SCHEMA.required_columns().map(String::from).collect();
        assert_eq!(loaded.table.columns(), expected.as_slice());
        assert_eq!(loaded.table.len(), 1);
        let row = &loaded.table.rows()[0];
        assert_eq!(row.keys().cloned().collect::<Vec<_>>(), expected);
        assert_eq!(row["Cultivo"], json!("Soja"));
        assert_eq!(row["ANO_POF"], json!(2008));
        assert_eq!(row["PC (kg)"], json!(61.23456));
        assert_eq!(row["Região"], Value::Null);
        assert!(row.get("Observação").is_none());
        assert!(loaded.metadata.is_empty());
    }

    #[test]
    fn test_mexico_layout_reads_metadata_and_offset_header() {
        let dir = TempDir::new().unwrap();
        let header: Vec<Value> = MEXICO_SCHEMA.required_columns().map(|c| json!(c)).collect();
        let path = write_sheet(
            &dir,
            "mexico.xlsx",
            &[
                vec![json!("ADI (mg/kg bw/day)"), json!(0.01)],
                vec![json!("bw (kg)"), json!(70)],
                vec![json!("IDMT"), json!(0.002)],
                vec![json!("%ADI"), json!(0.2)],
                vec![json!("Notas"), json!("NA")],
                vec![],
                header,
                vec![json!("Corn"), json!("Milho"), json!(0.05)],
            ],
        );

        let loaded = load_sheet(&path, &MEXICO_SCHEMA).unwrap();

        assert_eq!(loaded.table.len(), 1);
        assert_eq!(loaded.table.cell(0, "Crop"), &json!("Corn"));
        assert_eq!(loaded.table.cell(0, "LMR (mg/kg)"), &json!(0.05));
        assert_eq!(loaded.table.cell(0, "(LMR or R)*C"), &Value::Null);
        assert_eq!(loaded.metadata.len(), 5);
        assert_eq!(loaded.metadata[0], vec![json!("ADI (mg/kg bw/day)"), json!(0.01)]);
        assert_eq!(loaded.metadata[4], vec![json!("Notas"), json!("NA")]);
    }
}

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::dataset::DatasetSchema;
use crate::domain::error::{AppError, Result, SchemaDirection};
use crate::domain::table::{Row, Table};
use crate::infrastructure::excel::{load_metadata_block, load_sheet, save_sheet, LoadedSheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve the last loaded or saved sheet until the next successful save.
    KeepSnapshot,
    /// Read the file on every request.
    ReloadEveryRequest,
}

/// Result of a successful wholesale replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOutcome {
    pub row_count: usize,
    pub ignored_columns: Vec<String>,
}

/// One spreadsheet-backed dataset and its cached snapshot.
pub struct DatasetRepository {
    schema: &'static DatasetSchema,
    path: PathBuf,
    policy: CachePolicy,
    snapshot: Mutex<Option<Arc<LoadedSheet>>>,
}

impl DatasetRepository {
    pub fn new(schema: &'static DatasetSchema, path: PathBuf, policy: CachePolicy) -> Self {
        Self {
            schema,
            path,
            policy,
            snapshot: Mutex::new(None),
        }
    }

    pub fn schema(&self) -> &'static DatasetSchema {
        self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Current sheet, loading it when nothing is cached.
    pub fn current(&self) -> Result<Arc<LoadedSheet>> {
        let mut snapshot = self.lock_snapshot();
        if self.policy == CachePolicy::KeepSnapshot {
            if let Some(sheet) = snapshot.as_ref() {
                debug!(dataset = %self.schema.kind, "Serving cached snapshot");
                return Ok(Arc::clone(sheet));
            }
        }

        let sheet = Arc::new(load_sheet(&self.path, self.schema)?);
        if self.policy == CachePolicy::KeepSnapshot {
            *snapshot = Some(Arc::clone(&sheet));
        }
        Ok(sheet)
    }

    /// Replaces the whole table with `rows`.
    ///
    /// Every required column must appear in at least one row. Unknown columns
    /// are dropped and reported back, and rows left with no value are not
    /// written. Metadata rows above the header are read
    /// from disk right before writing so they survive the rewrite.
    pub fn replace(&self, rows: &[Row]) -> Result<ReplaceOutcome> {
        let mut seen: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                let key = key.trim();
                if !seen.iter().any(|s| s == key) {
                    seen.push(key.to_string());
                }
            }
        }

        let missing = self.schema.missing_columns(seen.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(AppError::schema(SchemaDirection::Save, missing));
        }

        let ignored_columns: Vec<String> = seen
            .iter()
            .filter(|name| !self.schema.knows_column(name))
            .cloned()
            .collect();
        let columns = self.schema.effective_columns(seen.iter().map(String::as_str));
        let projected: Vec<Row> = rows
            .iter()
            .map(|row| self.schema.project_row(row, &columns))
            .filter(|row| !row.values().all(Value::is_null))
            .collect();
        let table = Table::new(columns, projected);

        let mut snapshot = self.lock_snapshot();

        let metadata = match self.schema.layout.metadata_rows {
            0 => Vec::new(),
            count if self.path.exists() => load_metadata_block(&self.path, count)?,
            _ => Vec::new(),
        };

        save_sheet(&self.path, self.schema, &metadata, &table)?;

        let row_count = table.len();
        if self.policy == CachePolicy::KeepSnapshot {
            *snapshot = Some(Arc::new(LoadedSheet { table, metadata }));
        }

        info!(
            dataset = %self.schema.kind,
            rows = row_count,
            ignored = ignored_columns.len(),
            "Dataset replaced"
        );

        Ok(ReplaceOutcome {
            row_count,
            ignored_columns,
        })
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, Option<Arc<LoadedSheet>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{ACUTE_SCHEMA, CHRONIC_SCHEMA, MEXICO_SCHEMA};
    use serde_json::json;
    use tempfile::TempDir;

    fn full_row(schema: &DatasetSchema, values: Value) -> Row {
        let mut row = Row::new();
        for column in schema.required_columns() {
            row.insert(column.to_string(), Value::Null);
        }
        for (key, value) in values.as_object().unwrap() {
            row.insert(key.clone(), value.clone());
        }
        row
    }

    #[test]
    fn test_save_then_load_is_a_fixed_point() {
        let dir = TempDir::new().unwrap();
        let repo = DatasetRepository::new(
            &CHRONIC_SCHEMA,
            dir.path().join("chronic.xlsx"),
            CachePolicy::KeepSnapshot,
        );
        let rows = vec![
            full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Soja", "ANO_POF": 2008, "Região": "Sul", "PC (kg)": 1.25 })),
            full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Milho", "ANO_POF": 2017, "Região": "Norte", "LMR (mg_kg)": "0,5" })),
        ];

        repo.replace(&rows).unwrap();
        let first = load_sheet(repo.path(), &CHRONIC_SCHEMA).unwrap();
        repo.replace(first.table.rows()).unwrap();
        let second = load_sheet(repo.path(), &CHRONIC_SCHEMA).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.table.len(), 2);
        assert_eq!(first.table.cell(1, "LMR (mg_kg)"), &json!("0,5"));
    }

    #[test]
    fn test_replace_swaps_the_cached_snapshot() {
        let dir = TempDir::new().unwrap();
        let repo = DatasetRepository::new(
            &CHRONIC_SCHEMA,
            dir.path().join("chronic.xlsx"),
            CachePolicy::KeepSnapshot,
        );
        repo.replace(&[full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Soja" }))]).unwrap();
        let before = repo.current().unwrap();

        repo.replace(&[
            full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Arroz" })),
            full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Feijão" })),
        ])
        .unwrap();
        let after = repo.current().unwrap();

        assert_eq!(before.table.len(), 1);
        assert_eq!(after.table.len(), 2);
        assert_eq!(after.table.cell(1, "Cultivo"), &json!("Feijão"));
    }

    #[test]
    fn test_missing_columns_fail_without_touching_disk_or_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acute.xlsx");
        let repo = DatasetRepository::new(&ACUTE_SCHEMA, path.clone(), CachePolicy::KeepSnapshot);

        let err = repo.replace(&[Row::new()]).unwrap_err();

        assert!(matches!(
            err,
            AppError::SchemaError { direction: SchemaDirection::Save, .. }
        ));
        assert_eq!(err.missing_columns().map(|m| m.len()), Some(14));
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_columns_are_dropped_and_reported() {
        let dir = TempDir::new().unwrap();
        let repo = DatasetRepository::new(
            &CHRONIC_SCHEMA,
            dir.path().join("chronic.xlsx"),
            CachePolicy::KeepSnapshot,
        );
        let row = full_row(&CHRONIC_SCHEMA, json!({ "Cultivo": "Soja", " Notas ": "x" }));

        let outcome = repo.replace(&[row]).unwrap();

        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.ignored_columns, vec!["Notas"]);
        let loaded = load_sheet(repo.path(), &CHRONIC_SCHEMA).unwrap();
        assert!(!loaded.table.columns().iter().any(|c| c == "Notas"));
    }

    #[test]
    fn test_mexico_rewrite_keeps_metadata_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mexico.xlsx");
        let metadata = vec![
            vec![json!("ADI (mg/kg bw/day)"), json!(0.02)],
            vec![json!("bw (kg)"), json!(65)],
            vec![json!("IDMT"), json!(0.001)],
            vec![json!("%ADI"), json!(5)],
            vec![json!("Fonte"), json!("COFEPRIS")],
        ];
        let seed = Table::new(
            MEXICO_SCHEMA.required_columns().map(String::from).collect(),
            vec![full_row(&MEXICO_SCHEMA, json!({ "Crop": "Corn" }))],
        );
        save_sheet(&path, &MEXICO_SCHEMA, &metadata, &seed).unwrap();

        let repo = DatasetRepository::new(&MEXICO_SCHEMA, path, CachePolicy::ReloadEveryRequest);
        repo.replace(&[full_row(&MEXICO_SCHEMA, json!({ "Crop": "Rice", "R (mg/kg)": 0.1 }))])
            .unwrap();

        let reloaded = repo.current().unwrap();
        assert_eq!(reloaded.metadata, metadata);
        assert_eq!(reloaded.table.cell(0, "Crop"), &json!("Rice"));
    }

    #[test]
    fn test_reload_policy_sees_external_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mexico.xlsx");
        let repo = DatasetRepository::new(&MEXICO_SCHEMA, path.clone(), CachePolicy::ReloadEveryRequest);
        repo.replace(&[full_row(&MEXICO_SCHEMA, json!({ "Crop": "Corn" }))]).unwrap();
        assert_eq!(repo.current().unwrap().table.len(), 1);

        let edited = Table::new(
            MEXICO_SCHEMA.required_columns().map(String::from).collect(),
            vec![
                full_row(&MEXICO_SCHEMA, json!({ "Crop": "Corn" })),
                full_row(&MEXICO_SCHEMA, json!({ "Crop": "Wheat" })),
            ],
        );
        save_sheet(&path, &MEXICO_SCHEMA, &Vec::new(), &edited).unwrap();

        assert_eq!(repo.current().unwrap().table.len(), 2);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let repo = DatasetRepository::new(
            &ACUTE_SCHEMA,
            dir.path().join("absent.xlsx"),
            CachePolicy::KeepSnapshot,
        );
        assert!(matches!(repo.current(), Err(AppError::NotFound(_))));
        assert_eq!(repo.file_name(), "absent.xlsx");
    }
}

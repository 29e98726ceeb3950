use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::application::use_cases::aggregate_builder::build_chronic_aggregates;
use crate::domain::aggregate::ChronicAggregates;
use crate::domain::dataset::DatasetKind;
use crate::domain::error::{AppError, Result};
use crate::domain::metadata::MexicoMetadata;
use crate::domain::table::Row;
use crate::infrastructure::storage::DatasetRepository;

pub const ROWS_FIELD: &str = "rows";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub file_name: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Body of `GET /<dataset>/dados`.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetView {
    pub table: Vec<Row>,
    pub meta: DatasetMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregates: Option<ChronicAggregates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MexicoMetadata>,
}

/// Body of a successful `POST /<dataset>/atualizar`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub status: &'static str,
    pub row_count: usize,
    pub file_name: String,
    pub ignored_columns: Vec<String>,
}

pub struct DatasetUseCase {
    repository: Arc<DatasetRepository>,
    read_only: bool,
}

impl DatasetUseCase {
    pub fn new(repository: Arc<DatasetRepository>, read_only: bool) -> Self {
        Self {
            repository,
            read_only,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.repository.schema().kind
    }

    pub fn fetch(&self) -> Result<DatasetView> {
        let sheet = self.repository.current()?;
        let table = &sheet.table;

        let aggregates = match self.kind() {
            DatasetKind::Chronic => Some(build_chronic_aggregates(table.rows())),
            _ => None,
        };
        let metadata = match self.kind() {
            DatasetKind::Mexico => Some(MexicoMetadata::from_block(&sheet.metadata)),
            _ => None,
        };

        Ok(DatasetView {
            table: table.rows().to_vec(),
            meta: DatasetMeta {
                file_name: self.repository.file_name(),
                row_count: table.len(),
                columns: table.columns().to_vec(),
            },
            aggregates,
            metadata,
        })
    }

    /// Replaces the dataset with the rows in `body`.
    ///
    /// Writes being disabled is checked before the body is even parsed.
    pub fn update(&self, body: &[u8]) -> Result<UpdateOutcome> {
        if self.read_only {
            return Err(AppError::WriteDisabled);
        }

        let payload: Value =
            serde_json::from_slice(body).map_err(|e| AppError::ParseError(e.to_string()))?;
        let rows = parse_rows(payload, self.repository.schema().enveloped_updates)?;

        let outcome = self.repository.replace(&rows)?;
        info!(
            dataset = %self.kind(),
            rows = outcome.row_count,
            "Dataset update accepted"
        );

        Ok(UpdateOutcome {
            status: "saved",
            row_count: outcome.row_count,
            file_name: self.repository.file_name(),
            ignored_columns: outcome.ignored_columns,
        })
    }
}

fn parse_rows(payload: Value, enveloped: bool) -> Result<Vec<Row>> {
    let rows = if enveloped {
        match payload {
            Value::Object(mut envelope) => envelope.remove(ROWS_FIELD).ok_or_else(|| {
                AppError::ValidationError(format!("Campo '{}' é obrigatório.", ROWS_FIELD))
            })?,
            other => {
                return Err(AppError::ParseError(format!(
                    "esperado objeto com '{}', recebido {}",
                    ROWS_FIELD,
                    json_type(&other)
                )))
            }
        }
    } else {
        payload
    };

    let Value::Array(items) = rows else {
        return Err(AppError::ParseError(format!(
            "esperada lista de linhas, recebido {}",
            json_type(&rows)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(AppError::ParseError(format!(
                "linha {} não é um objeto ({})",
                index,
                json_type(&other)
            ))),
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{CHRONIC_SCHEMA, MEXICO_SCHEMA};
    use crate::infrastructure::storage::CachePolicy;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn chronic_rows() -> Value {
        let mut row = serde_json::Map::new();
        for column in CHRONIC_SCHEMA.required_columns() {
            row.insert(column.to_string(), Value::Null);
        }
        row.insert("Cultivo".into(), json!("Soja"));
        row.insert("ANO_POF".into(), json!(2008));
        row.insert("Região".into(), json!("Sul"));
        row.insert("PC (kg)".into(), json!(3.14159));
        json!([row])
    }

    fn chronic_use_case(dir: &TempDir, read_only: bool) -> (DatasetUseCase, PathBuf) {
        let path = dir.path().join("DietaCronicaOf.xlsx");
        let repository = Arc::new(DatasetRepository::new(
            &CHRONIC_SCHEMA,
            path.clone(),
            CachePolicy::KeepSnapshot,
        ));
        (DatasetUseCase::new(repository, read_only), path)
    }

    #[test]
    fn test_update_then_fetch_returns_rows_and_aggregates() {
        let dir = TempDir::new().unwrap();
        let (use_case, _) = chronic_use_case(&dir, false);
        let body = serde_json::to_vec(&chronic_rows()).unwrap();

        let outcome = use_case.update(&body).unwrap();
        let view = use_case.fetch().unwrap();

        assert_eq!(outcome.status, "saved");
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.file_name, "DietaCronicaOf.xlsx");
        assert_eq!(view.meta.row_count, 1);
        assert_eq!(view.meta.columns.len(), 12);
        let aggregates = view.aggregates.unwrap();
        assert_eq!(aggregates.pof_2008.per_capita_kg["Sul"], Some(3.1416));
        assert!(aggregates.pof_2017.is_empty());
        assert!(view.metadata.is_none());
    }

    #[test]
    fn test_read_only_rejects_before_parsing_and_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let (writer, path) = chronic_use_case(&dir, false);
        writer
            .update(&serde_json::to_vec(&chronic_rows()).unwrap())
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let (read_only, _) = chronic_use_case(&dir, true);
        let err = read_only.update(b"not even json").unwrap_err();

        assert!(matches!(err, AppError::WriteDisabled));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let (use_case, path) = chronic_use_case(&dir, false);

        assert!(matches!(use_case.update(b"{oops"), Err(AppError::ParseError(_))));
        assert!(matches!(use_case.update(b"[1, 2]"), Err(AppError::ParseError(_))));
        assert!(matches!(use_case.update(b"{\"rows\": []}"), Err(AppError::ParseError(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_mexico_envelope_without_rows_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let repository = Arc::new(DatasetRepository::new(
            &MEXICO_SCHEMA,
            dir.path().join("mexico.xlsx"),
            CachePolicy::ReloadEveryRequest,
        ));
        let use_case = DatasetUseCase::new(repository, false);

        let err = use_case.update(b"{\"linhas\": []}").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("rows")));

        let err = use_case.update(b"{\"rows\": [{}]}").unwrap_err();
        assert!(matches!(err, AppError::SchemaError { .. }));
    }

    #[test]
    fn test_mexico_fetch_exposes_metadata_defaults() {
        let dir = TempDir::new().unwrap();
        let repository = Arc::new(DatasetRepository::new(
            &MEXICO_SCHEMA,
            dir.path().join("mexico.xlsx"),
            CachePolicy::ReloadEveryRequest,
        ));
        let use_case = DatasetUseCase::new(repository, false);
        let mut row = serde_json::Map::new();
        for column in MEXICO_SCHEMA.required_columns() {
            row.insert(column.to_string(), Value::Null);
        }
        row.insert("Crop".into(), json!("Corn"));
        let body = serde_json::to_vec(&json!({ "rows": [row] })).unwrap();

        use_case.update(&body).unwrap();
        let view = use_case.fetch().unwrap();

        let metadata = view.metadata.unwrap();
        assert_eq!(metadata.adi, json!(0.05));
        assert_eq!(metadata.bw, json!(70));
        assert!(view.aggregates.is_none());
        assert_eq!(view.table[0]["Crop"], json!("Corn"));
    }
}

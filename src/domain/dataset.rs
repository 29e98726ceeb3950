use serde::{Deserialize, Serialize};
use std::fmt;

use super::table::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Chronic,
    Acute,
    Mexico,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Chronic => "chronic",
            DatasetKind::Acute => "acute",
            DatasetKind::Mexico => "mexico",
        }
    }

    pub fn schema(&self) -> &'static DatasetSchema {
        match self {
            DatasetKind::Chronic => &CHRONIC_SCHEMA,
            DatasetKind::Acute => &ACUTE_SCHEMA,
            DatasetKind::Mexico => &MEXICO_SCHEMA,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        required: false,
    }
}

/// Where the table sits inside the first worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Leading rows holding label/value metadata, preserved on write-back.
    pub metadata_rows: u32,
    /// Zero-based row holding the column headers.
    pub header_row: u32,
}

/// Ordered column contract of one dataset file.
#[derive(Debug)]
pub struct DatasetSchema {
    pub kind: DatasetKind,
    pub columns: &'static [ColumnSpec],
    pub layout: SheetLayout,
    /// Payload of the update route is `{ "rows": [...] }` instead of a bare array.
    pub enveloped_updates: bool,
}

impl DatasetSchema {
    pub fn required_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter(|column| column.required)
            .map(|column| column.name)
    }

    /// Required columns absent from `available`, in schema order.
    pub fn missing_columns<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: Vec<&str> = available.into_iter().map(str::trim).collect();
        self.required_columns()
            .filter(|name| !available.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Schema columns present in `available`, in schema order.
    pub fn effective_columns<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: Vec<&str> = available.into_iter().map(str::trim).collect();
        self.columns
            .iter()
            .filter(|column| column.required || available.contains(&column.name))
            .map(|column| column.name.to_string())
            .collect()
    }

    /// Rebuilds `row` with exactly `columns`, in order, keys trimmed.
    pub fn project_row(&self, row: &Row, columns: &[String]) -> Row {
        let mut projected = Row::new();
        for column in columns {
            let value = row
                .iter()
                .find(|(key, _)| key.trim() == column)
                .map(|(_, value)| value.clone())
                .unwrap_or(serde_json::Value::Null);
            projected.insert(column.clone(), value);
        }
        projected
    }

    pub fn knows_column(&self, name: &str) -> bool {
        let name = name.trim();
        self.columns.iter().any(|column| column.name == name)
    }
}

pub const CHRONIC_YEAR_COLUMN: &str = "ANO_POF";
pub const CHRONIC_REGION_COLUMN: &str = "Região";
pub const CHRONIC_CONSUMPTION_COLUMN: &str = "PC (kg)";

pub static CHRONIC_SCHEMA: DatasetSchema = DatasetSchema {
    kind: DatasetKind::Chronic,
    columns: &[
        required("Cultivo"),
        required(CHRONIC_YEAR_COLUMN),
        required(CHRONIC_REGION_COLUMN),
        required("LMR (mg_kg)"),
        required("MREC_STMR (mg_kg)"),
        required("Market Share"),
        required("IDMT (Numerador)"),
        required("Contribuição Individual do Cultivo"),
        required("Consumo diário per capita (g_dia_pessoa) C"),
        required("Fator de Processamento FP"),
        required("Fator de Conversão FC"),
        required(CHRONIC_CONSUMPTION_COLUMN),
    ],
    layout: SheetLayout {
        metadata_rows: 0,
        header_row: 0,
    },
    enveloped_updates: false,
};

pub static ACUTE_SCHEMA: DatasetSchema = DatasetSchema {
    kind: DatasetKind::Acute,
    columns: &[
        required("Cultivo/ Matriz Animal"),
        required("ANO POF"),
        required("Região"),
        required("Caso Fórmula"),
        required("Caso Mapeado"),
        required("LMR (mg/kg)"),
        required("HR/MCR (mg/kg)"),
        required("MREC/STMR (mg/kg)"),
        required("Consumo (g/dia/pessoa) Percentil 97,5"),
        required("Peso corpóreo da região (kg)"),
        required("Maior porção MP (g/dia/pessoa)"),
        required("Peso Corpóreo médio dos consumidores PC (kg)"),
        required("%DRFA ANVISA"),
        required("%DRFA SYNGENTA"),
        optional("IMEA (mg/kg p.c./dia)"),
        optional("Fator de Variabilidade"),
    ],
    layout: SheetLayout {
        metadata_rows: 0,
        header_row: 0,
    },
    enveloped_updates: false,
};

pub static MEXICO_SCHEMA: DatasetSchema = DatasetSchema {
    kind: DatasetKind::Mexico,
    columns: &[
        required("Crop"),
        required("Cultivo"),
        required("LMR (mg/kg)"),
        required("R (mg/kg)"),
        required("C (Kg/person/day)"),
        required("(LMR or R)*C"),
    ],
    layout: SheetLayout {
        metadata_rows: 5,
        header_row: 6,
    },
    enveloped_updates: true,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_columns_ignores_extras_and_order() {
        let available = ["Crop", "Extra", " (LMR or R)*C ", "Cultivo", "R (mg/kg)"];
        let missing = MEXICO_SCHEMA.missing_columns(available);
        assert_eq!(missing, vec!["LMR (mg/kg)", "C (Kg/person/day)"]);
    }

    #[test]
    fn test_effective_columns_keeps_present_optionals_only() {
        let mut available: Vec<&str> = ACUTE_SCHEMA.required_columns().collect();
        available.push("IMEA (mg/kg p.c./dia)");
        let columns = ACUTE_SCHEMA.effective_columns(available);
        assert_eq!(columns.len(), 15);
        assert_eq!(columns.last().map(String::as_str), Some("IMEA (mg/kg p.c./dia)"));
    }

    #[test]
    fn test_project_row_orders_and_fills() {
        let row = json!({ "Cultivo": "Milho", " Crop ": "Corn", "Noise": 1 });
        let row = row.as_object().unwrap();
        let columns = vec!["Crop".to_string(), "Cultivo".to_string(), "R (mg/kg)".to_string()];
        let projected = MEXICO_SCHEMA.project_row(row, &columns);
        let keys: Vec<&String> = projected.keys().collect();
        assert_eq!(keys, vec!["Crop", "Cultivo", "R (mg/kg)"]);
        assert_eq!(projected["Crop"], json!("Corn"));
        assert_eq!(projected["R (mg/kg)"], json!(null));
    }

    #[test]
    fn test_chronic_schema_has_twelve_required_columns() {
        assert_eq!(CHRONIC_SCHEMA.required_columns().count(), 12);
        assert_eq!(DatasetKind::Chronic.schema().kind, DatasetKind::Chronic);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the spreadsheet boundary a schema check failed on.
///
/// A file on disk missing columns is a server-side fault; a payload missing
/// columns is the client's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaDirection {
    Load,
    Save,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ReadError(String),
    SchemaError {
        direction: SchemaDirection,
        missing: Vec<String>,
    },
    ParseError(String),
    ValidationError(String),
    Locked(String),
    WriteDisabled,
    WriteError(String),
}

impl AppError {
    pub fn schema(direction: SchemaDirection, missing: Vec<String>) -> Self {
        AppError::SchemaError { direction, missing }
    }

    /// Stable machine-readable tag used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "Internal",
            AppError::NotFound(_) => "NotFound",
            AppError::ReadError(_) => "ReadError",
            AppError::SchemaError { .. } => "SchemaError",
            AppError::ParseError(_) => "ParseError",
            AppError::ValidationError(_) => "ValidationError",
            AppError::Locked(_) => "LockedError",
            AppError::WriteDisabled => "WriteDisabled",
            AppError::WriteError(_) => "WriteError",
        }
    }

    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            AppError::SchemaError { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Arquivo não encontrado: {}", msg),
            AppError::ReadError(msg) => write!(f, "Erro lendo Excel: {}", msg),
            AppError::SchemaError { direction, missing } => match direction {
                SchemaDirection::Load => write!(f, "Colunas ausentes: {:?}", missing),
                SchemaDirection::Save => write!(f, "Faltam colunas: {:?}", missing),
            },
            AppError::ParseError(msg) => write!(f, "JSON inválido: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Locked(msg) => write!(f, "{}", msg),
            AppError::WriteDisabled => {
                write!(f, "Gravação desabilitada neste ambiente (somente leitura).")
            }
            AppError::WriteError(msg) => write!(f, "Erro ao gravar Excel: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::WriteError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

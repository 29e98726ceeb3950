use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::error::{AppError, SchemaDirection};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_columns: Option<&'a [String]>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ParseError(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::SchemaError {
                direction: SchemaDirection::Save,
                ..
            } => StatusCode::BAD_REQUEST,
            AppError::Locked(_) => StatusCode::LOCKED,
            AppError::WriteDisabled => StatusCode::NOT_IMPLEMENTED,
            AppError::SchemaError { .. }
            | AppError::NotFound(_)
            | AppError::ReadError(_)
            | AppError::WriteError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
            missing_columns: self.missing_columns(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), 500),
            (AppError::ReadError("x".into()), 500),
            (AppError::schema(SchemaDirection::Load, vec![]), 500),
            (AppError::schema(SchemaDirection::Save, vec![]), 400),
            (AppError::ParseError("x".into()), 400),
            (AppError::ValidationError("x".into()), 400),
            (AppError::Locked("x".into()), 423),
            (AppError::WriteDisabled, 501),
            (AppError::WriteError("x".into()), 500),
            (AppError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{}", err.kind());
        }
    }

    #[actix_web::test]
    async fn test_schema_error_body_lists_columns() {
        let err = AppError::schema(SchemaDirection::Save, vec!["Região".to_string()]);
        let response = err.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "SchemaError");
        assert_eq!(json["missingColumns"], serde_json::json!(["Região"]));
        assert!(json["detail"].as_str().unwrap().contains("Região"));
    }
}

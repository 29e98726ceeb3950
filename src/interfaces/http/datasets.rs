use actix_web::{get, post, web, HttpResponse};
use std::sync::Arc;

use super::{add_log, HttpState};
use crate::application::use_cases::dataset_service::DatasetUseCase;
use crate::domain::error::{AppError, Result};

const SOURCE: &str = "Datasets";

async fn fetch(data: &HttpState, use_case: &Arc<DatasetUseCase>) -> Result<HttpResponse> {
    let kind = use_case.kind();
    let use_case = Arc::clone(use_case);
    let view = web::block(move || use_case.fetch())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match view {
        Ok(view) => {
            add_log(
                &data.logs,
                "INFO",
                SOURCE,
                &format!("Served {} ({} rows)", kind, view.meta.row_count),
            );
            Ok(HttpResponse::Ok().json(view))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                SOURCE,
                &format!("Failed to load {}: {}", kind, e),
            );
            Err(e)
        }
    }
}

async fn update(
    data: &HttpState,
    use_case: &Arc<DatasetUseCase>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let kind = use_case.kind();
    let use_case = Arc::clone(use_case);
    let outcome = web::block(move || use_case.update(&body))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match outcome {
        Ok(outcome) => {
            let mut message = format!("Saved {} ({} rows)", kind, outcome.row_count);
            if !outcome.ignored_columns.is_empty() {
                message.push_str(&format!(", ignored {:?}", outcome.ignored_columns));
            }
            add_log(&data.logs, "INFO", SOURCE, &message);
            Ok(HttpResponse::Ok().json(outcome))
        }
        Err(e) => {
            let level = match e {
                AppError::WriteDisabled | AppError::Locked(_) => "WARN",
                _ => "ERROR",
            };
            add_log(
                &data.logs,
                level,
                SOURCE,
                &format!("Failed to save {}: {}", kind, e),
            );
            Err(e)
        }
    }
}

#[get("/chronic/dados")]
pub async fn chronic_data(data: web::Data<HttpState>) -> Result<HttpResponse> {
    fetch(&data, &data.chronic).await
}

#[post("/chronic/atualizar")]
pub async fn chronic_update(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    update(&data, &data.chronic, body).await
}

#[get("/acute/dados")]
pub async fn acute_data(data: web::Data<HttpState>) -> Result<HttpResponse> {
    fetch(&data, &data.acute).await
}

#[post("/acute/atualizar")]
pub async fn acute_update(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    update(&data, &data.acute, body).await
}

#[get("/mexico/dados")]
pub async fn mexico_data(data: web::Data<HttpState>) -> Result<HttpResponse> {
    fetch(&data, &data.mexico).await
}

#[post("/mexico/atualizar")]
pub async fn mexico_update(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    update(&data, &data.mexico, body).await
}

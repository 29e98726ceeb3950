use actix_web::http::header;
use actix_web::{post, web, HttpResponse};
use chrono::Local;
use std::sync::Arc;

use super::{add_log, HttpState};
use crate::domain::error::{AppError, Result};
use crate::domain::report::SectionKind;

const SOURCE: &str = "Report";

async fn render(data: &HttpState, body: web::Bytes, only: Option<SectionKind>) -> Result<HttpResponse> {
    let reports = Arc::clone(&data.reports);
    let now = Local::now().naive_local();
    let report = web::block(move || reports.generate(&body, only, now))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match report {
        Ok(report) => {
            add_log(
                &data.logs,
                "INFO",
                SOURCE,
                &format!("Generated {} ({} bytes)", report.file_name, report.bytes.len()),
            );
            Ok(HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", report.file_name),
                ))
                .body(report.bytes))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                SOURCE,
                &format!("Report generation failed: {}", e),
            );
            Err(e)
        }
    }
}

#[post("/relatorio/gerar-pdf")]
pub async fn generate_report(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    render(&data, body, None).await
}

#[post("/report/gerar-pdf")]
pub async fn generate_report_alias(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    render(&data, body, None).await
}

#[post("/acute/gerar-pdf")]
pub async fn generate_acute_report(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    render(&data, body, Some(SectionKind::Acute)).await
}

#[post("/chronic/gerar-pdf")]
pub async fn generate_chronic_report(data: web::Data<HttpState>, body: web::Bytes) -> Result<HttpResponse> {
    render(&data, body, Some(SectionKind::Chronic)).await
}

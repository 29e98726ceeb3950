use chrono::NaiveDateTime;
use tracing::info;

use crate::application::use_cases::report_assembler::{ReportAssembler, ReportPlan};
use crate::domain::error::{AppError, Result};
use crate::domain::report::{ReportRequest, SectionKind};
use crate::infrastructure::pdf::PdfRenderer;

/// A rendered report ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub file_name: String,
    pub sections: Vec<SectionKind>,
    pub bytes: Vec<u8>,
}

pub struct ReportUseCase {
    renderer: PdfRenderer,
}

impl Default for ReportUseCase {
    fn default() -> Self {
        Self::new(PdfRenderer::default())
    }
}

impl ReportUseCase {
    pub fn new(renderer: PdfRenderer) -> Self {
        Self { renderer }
    }

    /// Parses the composite payload and renders every section it fills.
    /// `only` narrows the report to one calculator.
    pub fn generate(
        &self,
        body: &[u8],
        only: Option<SectionKind>,
        now: NaiveDateTime,
    ) -> Result<GeneratedReport> {
        let request: ReportRequest =
            serde_json::from_slice(body).map_err(|e| AppError::ParseError(e.to_string()))?;

        let mut plan = ReportPlan::from_request(&request);
        if let Some(kind) = only {
            plan = plan.restrict_to(kind);
        }

        let document = ReportAssembler::new(now).assemble(&request, &plan);
        let bytes = self.renderer.render(&document)?;
        let file_name = plan.file_name(now.date());

        info!(
            file = %file_name,
            sections = plan.sections().len(),
            bytes = bytes.len(),
            "Report generated"
        );

        Ok(GeneratedReport {
            file_name,
            sections: plan.sections().to_vec(),
            bytes,
        })
    }
}

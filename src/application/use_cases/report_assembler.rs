//! Composes the combined dietary-risk report.
//!
//! [`ReportPlan::from_request`] filters the raw payload and decides which
//! sections are in; [`ReportAssembler::assemble`] turns the plan into a
//! [`ReportDocument`] with one section per included dataset, separated by
//! page breaks.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::application::use_cases::row_filter::{
    acute_report_rows, chronic_report_rows, mexico_report_rows,
};
use crate::domain::aggregate::{METRIC_EXTERNAL, METRIC_INTERNAL, METRIC_PER_CAPITA, REGIONS};
use crate::domain::document::{Block, ReportDocument, ReportTable, Rgb, TextRun};
use crate::domain::report::{ReportRequest, SectionKind, MEXICO_RESULT_FIELDS};
use crate::domain::table::{display_value, is_number_like, Row};

pub const NO_DATA_MESSAGE: &str = "Nenhum dado para gerar relatório.";

const ACUTE_ACCENT: Rgb = Rgb::hex(0x4CAF50);
const CHRONIC_ACCENT: Rgb = Rgb::hex(0x1976D2);
const WATER_ACUTE_ACCENT: Rgb = Rgb::hex(0x009688);
const WATER_CHRONIC_ACCENT: Rgb = Rgb::hex(0x3F51B5);
const MEXICO_ACCENT: Rgb = Rgb::hex(0xF08C1B);
const MEXICO_RESULTS_ACCENT: Rgb = Rgb::hex(0xF08F21);
const POF_ACCENT: Rgb = Rgb::hex(0x455A64);

const MISSING_REGION_VALUE: &str = "—";

/// Header label plus the row keys it reads, first present key wins.
struct ColumnDef {
    label: &'static str,
    keys: &'static [&'static str],
    width: f32,
}

const fn column(label: &'static str, keys: &'static [&'static str], width: f32) -> ColumnDef {
    ColumnDef { label, keys, width }
}

const ACUTE_COLUMNS: [ColumnDef; 10] = [
    column("Cultivo", &["Cultivo/ Matriz Animal"], 120.0),
    column("ANO\nPOF", &["ANO POF"], 60.0),
    column("Região", &["Região"], 90.0),
    column("Caso\nFórmula", &["Caso Fórmula"], 80.0),
    column("LMR\n(mg/kg)", &["LMR (mg/kg)"], 70.0),
    column("HR/MCR", &["HR/MCR (mg/kg)"], 70.0),
    column("MREC/STMR", &["MREC/STMR (mg/kg)"], 70.0),
    column("IMEA", &["IMEA (mg/kg p.c./dia)"], 150.0),
    column("%DRFA\nExterno", &["%DRFA ANVISA"], 100.0),
    column("%DRFA\nInterno", &["%DRFA SYNGENTA"], 100.0),
];

const CHRONIC_COLUMNS: [ColumnDef; 8] = [
    column("Cultivo", &["Cultivo"], 150.0),
    column("ANO\nPOF", &["ANO_POF"], 60.0),
    column("Região", &["Região"], 90.0),
    column("LMR\n(mg/kg)", &["LMR (mg_kg)", "LMR (mg/kg)"], 90.0),
    column("MREC_STMR\n(mg/kg)", &["MREC_STMR (mg_kg)", "MREC_STMR (mg/kg)"], 110.0),
    column("Market\nShare (%)", &["Market Share (%)", "Market Share"], 120.0),
    column("IDMT\n(%)", &["IDMT (%)", "IDMT (Numerador)"], 160.0),
    column(
        "Contribuição\nIndividual (%)",
        &[
            "Contribuição Individual do Cultivo (%)",
            "Contribuição Individual do Cultivo",
        ],
        170.0,
    ),
];

const MEXICO_COLUMNS: [ColumnDef; 6] = [
    column("Crop", &["Crop"], 120.0),
    column("Cultivo", &["Cultivo"], 120.0),
    column("LMR (mg/kg)", &["LMR (mg/kg)"], 120.0),
    column("R (mg/kg)", &["R (mg/kg)"], 120.0),
    column("C (Kg/person/day)", &["C (Kg/person/day)"], 120.0),
    column("(LMR or R)*C", &["(LMR or R)*C"], 120.0),
];

const MEXICO_RESULT_COLUMNS: [(&str, &str, f32); 5] = [
    ("BW (kg)", "bw", 80.0),
    ("Sum", "sum", 180.0),
    ("ADI (mg/kg bw/dia)", "adi", 160.0),
    ("IDMT", "idmt", 180.0),
    ("%ADI", "percentAdi", 180.0),
];

const WATER_WIDTHS: [f32; 7] = [100.0, 100.0, 100.0, 120.0, 120.0, 120.0, 120.0];

/// Filtered rows and the sections they put in the report.
#[derive(Debug, Clone, Default)]
pub struct ReportPlan {
    pub acute_rows: Vec<Row>,
    pub chronic_rows: Vec<Row>,
    pub mexico_rows: Vec<Row>,
    sections: Vec<SectionKind>,
}

impl ReportPlan {
    pub fn from_request(request: &ReportRequest) -> Self {
        let acute_rows = acute_report_rows(&request.acute);
        let chronic_rows = chronic_report_rows(&request.chronic);
        let mexico_rows = mexico_report_rows(&request.mexico.data);

        let has_mexico_results = MEXICO_RESULT_FIELDS.iter().any(|field| {
            request
                .mexico
                .results
                .get(*field)
                .map(is_number_like)
                .unwrap_or(false)
        });

        let sections = SectionKind::DOCUMENT_ORDER
            .into_iter()
            .filter(|kind| match kind {
                SectionKind::Acute => !acute_rows.is_empty(),
                SectionKind::Chronic => !chronic_rows.is_empty(),
                SectionKind::WaterChronic => request.water_chronic_requested(),
                SectionKind::WaterAcute => request.water_acute_requested(),
                SectionKind::Mexico => !mexico_rows.is_empty() || has_mexico_results,
            })
            .collect();

        Self {
            acute_rows,
            chronic_rows,
            mexico_rows,
            sections,
        }
    }

    /// Keeps only `kind`, for the single-calculator report routes.
    pub fn restrict_to(mut self, kind: SectionKind) -> Self {
        self.sections.retain(|section| *section == kind);
        self
    }

    pub fn includes(&self, kind: SectionKind) -> bool {
        self.sections.contains(&kind)
    }

    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// `riskwise_<parts>_<YYYY-MM-DD>.pdf`, parts being the included sections.
    pub fn file_name(&self, date: NaiveDate) -> String {
        let parts: Vec<&str> = SectionKind::FILENAME_ORDER
            .iter()
            .filter(|kind| self.includes(**kind))
            .map(SectionKind::filename_part)
            .collect();
        let parts = if parts.is_empty() {
            "empty".to_string()
        } else {
            parts.join("_")
        };
        format!("riskwise_{}_{}.pdf", parts, date.format("%Y-%m-%d"))
    }
}

pub struct ReportAssembler {
    generated_at: NaiveDateTime,
}

impl ReportAssembler {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    pub fn assemble(&self, request: &ReportRequest, plan: &ReportPlan) -> ReportDocument {
        let mut document = ReportDocument::default();

        if plan.is_empty() {
            document.push(Block::Title(NO_DATA_MESSAGE.to_string()));
            return document;
        }

        for (index, kind) in plan.sections().iter().enumerate() {
            if index > 0 {
                document.push(Block::PageBreak);
            }
            let blocks = match kind {
                SectionKind::Acute => self.acute_section(request, &plan.acute_rows),
                SectionKind::Chronic => self.chronic_section(request, &plan.chronic_rows),
                SectionKind::WaterChronic => self.water_chronic_section(request),
                SectionKind::WaterAcute => self.water_acute_section(request),
                SectionKind::Mexico => self.mexico_section(request, &plan.mexico_rows),
            };
            document.blocks.extend(blocks);
        }

        document
    }

    fn acute_section(&self, request: &ReportRequest, rows: &[Row]) -> Vec<Block> {
        let external = ReportRequest::first_truthy(&[
            &request.acute_drfa_externo,
            &request.drfa_externo,
        ]);
        let internal = ReportRequest::first_truthy(&[
            &request.acute_drfa_interno,
            &request.drfa_interno,
        ]);

        let mut blocks = self.section_heading(
            "Acute Diet Calculator",
            ("DRFA Externo:", scalar_text(external)),
            ("DRFA Interno:", scalar_text(internal)),
        );
        blocks.push(Block::Spacer(20.0));
        blocks.push(Block::Table(data_table(&ACUTE_COLUMNS, rows, ACUTE_ACCENT)));
        blocks
    }

    fn chronic_section(&self, request: &ReportRequest, rows: &[Row]) -> Vec<Block> {
        let mut blocks = self.section_heading(
            "Chronic DRA Calculator",
            ("IDA Externo:", scalar_text(request.chronic_ida_externo.as_ref())),
            ("IDA Interno:", scalar_text(request.chronic_ida_interno.as_ref())),
        );
        blocks.push(Block::Spacer(20.0));
        blocks.push(Block::Table(data_table(&CHRONIC_COLUMNS, rows, CHRONIC_ACCENT)));
        blocks.push(Block::Spacer(24.0));

        let snapshots = [
            ("POF 2008", request.pof2008.as_ref()),
            ("POF 2017", request.pof2017.as_ref()),
        ];
        for (title, snapshot) in snapshots {
            let Some(snapshot) = snapshot.and_then(Value::as_object).filter(|s| !s.is_empty())
            else {
                continue;
            };
            blocks.push(Block::Title(title.to_string()));
            blocks.push(Block::Table(pof_table(snapshot)));
            blocks.push(Block::Spacer(16.0));
        }

        blocks
    }

    fn water_chronic_section(&self, request: &ReportRequest) -> Vec<Block> {
        let water = &request.water_chronic;
        let mut blocks = self.section_heading(
            "Water Chronic Calculator",
            ("IDA Externo:", scalar_text(water.ida_external.as_ref())),
            ("IDA Interno:", scalar_text(water.ida_internal.as_ref())),
        );
        blocks.push(Block::Spacer(12.0));

        let mut table = ReportTable::new(
            &[
                "Concentração",
                "Peso Adulto",
                "Peso Criança",
                "%IDA Interno Adulto",
                "%IDA Externo Adulto",
                "%IDA Interno Criança",
                "%IDA Externo Criança",
            ],
            &WATER_WIDTHS,
            WATER_CHRONIC_ACCENT,
        );
        table.push_row(
            [
                &water.concentration,
                &water.adult_weight,
                &water.child_weight,
                &water.internal_adult,
                &water.external_adult,
                &water.internal_child,
                &water.external_child,
            ]
            .into_iter()
            .map(|value| scalar_text(value.as_ref()))
            .collect(),
        );
        blocks.push(Block::Table(table));
        blocks
    }

    fn water_acute_section(&self, request: &ReportRequest) -> Vec<Block> {
        let water = &request.water_acute;
        let mut blocks = self.section_heading(
            "Water Acute Calculator",
            ("DRFA Externo:", scalar_text(water.drfa_external.as_ref())),
            ("DRFA Interno:", scalar_text(water.drfa_internal.as_ref())),
        );
        blocks.push(Block::Spacer(12.0));

        let mut table = ReportTable::new(
            &[
                "Concentração",
                "Peso Adulto",
                "Peso Criança",
                "%DRFA Interno Adulto",
                "%DRFA Externo Adulto",
                "%DRFA Interno Criança",
                "%DRFA Externo Criança",
            ],
            &WATER_WIDTHS,
            WATER_ACUTE_ACCENT,
        );
        table.push_row(
            [
                &water.concentration,
                &water.adult_weight,
                &water.child_weight,
                &water.internal_adult,
                &water.external_adult,
                &water.internal_child,
                &water.external_child,
            ]
            .into_iter()
            .map(|value| scalar_text(value.as_ref()))
            .collect(),
        );
        blocks.push(Block::Table(table));
        blocks
    }

    fn mexico_section(&self, request: &ReportRequest, rows: &[Row]) -> Vec<Block> {
        let results = &request.mexico.results;
        let mut blocks = self.section_heading(
            "Mexico Chronic Calculator",
            ("ADI (mg/kg bw/day):", scalar_text(results.get("adi"))),
            ("BW (kg):", scalar_text(results.get("bw"))),
        );
        blocks.push(Block::Spacer(20.0));
        blocks.push(Block::Table(data_table(&MEXICO_COLUMNS, rows, MEXICO_ACCENT)));
        blocks.push(Block::Spacer(16.0));

        let labels: Vec<&str> = MEXICO_RESULT_COLUMNS.iter().map(|(label, _, _)| *label).collect();
        let widths: Vec<f32> = MEXICO_RESULT_COLUMNS.iter().map(|(_, _, width)| *width).collect();
        let mut summary = ReportTable::new(&labels, &widths, MEXICO_RESULTS_ACCENT);
        summary.push_row(
            MEXICO_RESULT_COLUMNS
                .iter()
                .map(|(_, key, _)| scalar_text(results.get(*key)))
                .collect(),
        );
        blocks.push(Block::Table(summary));
        blocks.push(Block::Spacer(24.0));
        blocks
    }

    /// Title, metric summary line and generation timestamp.
    fn section_heading(
        &self,
        title: &str,
        first: (&str, String),
        second: (&str, String),
    ) -> Vec<Block> {
        vec![
            Block::Title(title.to_string()),
            Block::Paragraph {
                runs: vec![
                    TextRun::bold(first.0),
                    TextRun::plain(format!(" {}    ", first.1)),
                    TextRun::bold(second.0),
                    TextRun::plain(format!(" {}", second.1)),
                ],
                size: 14.0,
            },
            Block::Paragraph {
                runs: vec![TextRun::plain(format!(
                    "Gerado em: {}",
                    self.generated_at.format("%d/%m/%Y %H:%M")
                ))],
                size: 12.0,
            },
        ]
    }
}

/// Summary scalar text; absent, null and empty render as `-`.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) if text.is_empty() => "-".to_string(),
        other => display_value(other),
    }
}

fn row_cell(row: &Row, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| row.get(*key))
        .map(|value| display_value(Some(value)))
        .unwrap_or_else(|| "-".to_string())
}

fn data_table(columns: &[ColumnDef], rows: &[Row], accent: Rgb) -> ReportTable {
    let labels: Vec<&str> = columns.iter().map(|column| column.label).collect();
    let widths: Vec<f32> = columns.iter().map(|column| column.width).collect();
    let mut table = ReportTable::new(&labels, &widths, accent);
    for row in rows {
        table.push_row(columns.iter().map(|column| row_cell(row, column.keys)).collect());
    }
    table
}

fn pof_table(snapshot: &Map<String, Value>) -> ReportTable {
    let mut header = vec!["Métrica"];
    header.extend(REGIONS);
    let mut widths: Vec<f32> = vec![100.0];
    widths.extend([80.0; 6]);

    let mut table = ReportTable::new(&header, &widths, POF_ACCENT).with_font_sizes(10.0, 10.0);
    let metrics = [
        ("PC (Kg)", METRIC_PER_CAPITA),
        ("IDA_EXTERNA", METRIC_EXTERNAL),
        ("IDA_INTERNA", METRIC_INTERNAL),
    ];
    for (label, metric) in metrics {
        let values = snapshot.get(metric).and_then(Value::as_object);
        let mut cells = vec![label.to_string()];
        cells.extend(REGIONS.iter().map(|region| region_value(values, region)));
        table.push_row(cells);
    }
    table
}

fn region_value(values: Option<&Map<String, Value>>, region: &str) -> String {
    let Some(values) = values else {
        return MISSING_REGION_VALUE.to_string();
    };
    let value = values.get(region).or_else(|| {
        if region == "Centro-Oeste" {
            values.get("Centro_Oeste")
        } else {
            None
        }
    });
    match value {
        None | Some(Value::Null) => MISSING_REGION_VALUE.to_string(),
        Some(value) => display_value(Some(value)),
    }
}

// ============================================================
// REPORT PAYLOAD
// ============================================================
// Composite body of the report routes, keyed the way the calculator pages
// post it

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::table::{is_truthy, Row};

/// Treats an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Acute,
    Chronic,
    WaterChronic,
    WaterAcute,
    Mexico,
}

impl SectionKind {
    /// Order sections appear in the document.
    pub const DOCUMENT_ORDER: [SectionKind; 5] = [
        SectionKind::Acute,
        SectionKind::Chronic,
        SectionKind::WaterChronic,
        SectionKind::WaterAcute,
        SectionKind::Mexico,
    ];

    /// Order sections are named in the download file name.
    pub const FILENAME_ORDER: [SectionKind; 5] = [
        SectionKind::Acute,
        SectionKind::Chronic,
        SectionKind::WaterAcute,
        SectionKind::WaterChronic,
        SectionKind::Mexico,
    ];

    pub fn filename_part(&self) -> &'static str {
        match self {
            SectionKind::Acute => "acute",
            SectionKind::Chronic => "chronic",
            SectionKind::WaterChronic => "waterChronic",
            SectionKind::WaterAcute => "waterAcute",
            SectionKind::Mexico => "mexico",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaterAcuteInput {
    #[serde(default, rename = "water_conc")]
    pub concentration: Option<Value>,
    #[serde(default, rename = "water_adulto")]
    pub adult_weight: Option<Value>,
    #[serde(default, rename = "water_crianca")]
    pub child_weight: Option<Value>,
    #[serde(default, rename = "water_int_adulto")]
    pub internal_adult: Option<Value>,
    #[serde(default, rename = "water_ext_adulto")]
    pub external_adult: Option<Value>,
    #[serde(default, rename = "water_int_crianca")]
    pub internal_child: Option<Value>,
    #[serde(default, rename = "water_ext_crianca")]
    pub external_child: Option<Value>,
    #[serde(default, rename = "water_drfa_externo")]
    pub drfa_external: Option<Value>,
    #[serde(default, rename = "water_drfa_interno")]
    pub drfa_internal: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaterChronicInput {
    #[serde(default, rename = "CRONICO_conc")]
    pub concentration: Option<Value>,
    #[serde(default, rename = "CRONICO_adulto")]
    pub adult_weight: Option<Value>,
    #[serde(default, rename = "CRONICO_crianca")]
    pub child_weight: Option<Value>,
    #[serde(default, rename = "CRONICO_outIntAdulto")]
    pub internal_adult: Option<Value>,
    #[serde(default, rename = "CRONICO_outExtAdulto")]
    pub external_adult: Option<Value>,
    #[serde(default, rename = "CRONICO_outIntCrianca")]
    pub internal_child: Option<Value>,
    #[serde(default, rename = "CRONICO_outExtCrianca")]
    pub external_child: Option<Value>,
    #[serde(default, rename = "CRONICO_IDA_ANVISA_VAL")]
    pub ida_external: Option<Value>,
    #[serde(default, rename = "CRONICO_IDA_SYNGENTA_VAL")]
    pub ida_internal: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MexicoReportInput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Map<String, Value>,
}

/// Result fields whose numeric presence alone puts the Mexico section in.
pub const MEXICO_RESULT_FIELDS: [&str; 5] = ["adi", "idmt", "percentAdi", "sum", "bw"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub acute: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chronic: Vec<Row>,
    #[serde(default)]
    pub pof2008: Option<Value>,
    #[serde(default)]
    pub pof2017: Option<Value>,

    #[serde(default)]
    pub acute_drfa_externo: Option<Value>,
    #[serde(default)]
    pub acute_drfa_interno: Option<Value>,
    #[serde(default)]
    pub drfa_externo: Option<Value>,
    #[serde(default)]
    pub drfa_interno: Option<Value>,
    #[serde(default)]
    pub chronic_ida_externo: Option<Value>,
    #[serde(default)]
    pub chronic_ida_interno: Option<Value>,

    #[serde(flatten)]
    pub water_acute: WaterAcuteInput,
    #[serde(flatten)]
    pub water_chronic: WaterChronicInput,
    #[serde(default, rename = "incluirWaterAcute")]
    pub include_water_acute: Option<Value>,
    #[serde(default, rename = "incluirWaterChronic")]
    pub include_water_chronic: Option<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mexico: MexicoReportInput,
}

impl ReportRequest {
    pub fn water_acute_requested(&self) -> bool {
        self.include_water_acute.as_ref().map(is_truthy).unwrap_or(false)
    }

    pub fn water_chronic_requested(&self) -> bool {
        self.include_water_chronic.as_ref().map(is_truthy).unwrap_or(false)
    }

    /// First truthy value among `candidates`.
    pub fn first_truthy<'a>(candidates: &[&'a Option<Value>]) -> Option<&'a Value> {
        candidates
            .iter()
            .copied()
            .filter_map(Option::as_ref)
            .find(|value| is_truthy(value))
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Survey years the chronic calculator reports on.
pub const POF_YEARS: [i64; 2] = [2008, 2017];

/// Region columns of the POF tables, in report order.
pub const REGIONS: [&str; 6] = ["Brasil", "Centro-Oeste", "Nordeste", "Norte", "Sudeste", "Sul"];

pub const METRIC_PER_CAPITA: &str = "PC_Kg";
pub const METRIC_EXTERNAL: &str = "%IDA_ANVISA";
pub const METRIC_INTERNAL: &str = "%IDA_SYNGENTA";

/// Per-region summary for one survey year. Only `PC_Kg` is computed here;
/// the percentage maps are placeholders filled in by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PofAggregate {
    #[serde(rename = "PC_Kg")]
    pub per_capita_kg: BTreeMap<String, Option<f64>>,
    #[serde(rename = "%IDA_ANVISA")]
    pub ida_external: BTreeMap<String, Option<f64>>,
    #[serde(rename = "%IDA_SYNGENTA")]
    pub ida_internal: BTreeMap<String, Option<f64>>,
}

impl PofAggregate {
    pub fn set_region(&mut self, region: &str, per_capita_kg: f64) {
        self.per_capita_kg
            .insert(region.to_string(), Some(per_capita_kg));
        self.ida_external.insert(region.to_string(), None);
        self.ida_internal.insert(region.to_string(), None);
    }

    pub fn is_empty(&self) -> bool {
        self.per_capita_kg.is_empty()
    }
}

/// Both survey snapshots as served by the chronic `dados` route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChronicAggregates {
    #[serde(rename = "POF_2008")]
    pub pof_2008: PofAggregate,
    #[serde(rename = "POF_2017")]
    pub pof_2017: PofAggregate,
}

impl ChronicAggregates {
    pub fn for_year_mut(&mut self, year: i64) -> Option<&mut PofAggregate> {
        match year {
            2008 => Some(&mut self.pof_2008),
            2017 => Some(&mut self.pof_2017),
            _ => None,
        }
    }
}

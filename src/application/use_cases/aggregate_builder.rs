//! POF aggregates for the chronic calculator.
//!
//! For each survey year the per-capita consumption column is bucketed by
//! region. A later row for the same region and year replaces an earlier
//! one. Rows whose consumption is not numeric are skipped, never fatal.

use serde_json::Value;
use tracing::warn;

use crate::domain::aggregate::{ChronicAggregates, PofAggregate, POF_YEARS};
use crate::domain::dataset::{
    CHRONIC_CONSUMPTION_COLUMN, CHRONIC_REGION_COLUMN, CHRONIC_YEAR_COLUMN,
};
use crate::domain::table::{parse_number_like, Row};

/// Rounds half away from zero to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn build_chronic_aggregates(rows: &[Row]) -> ChronicAggregates {
    let mut aggregates = ChronicAggregates::default();
    for year in POF_YEARS {
        if let Some(target) = aggregates.for_year_mut(year) {
            *target = build_year_aggregate(rows, year);
        }
    }
    aggregates
}

pub fn build_year_aggregate(rows: &[Row], year: i64) -> PofAggregate {
    let mut aggregate = PofAggregate::default();

    for (index, row) in rows.iter().enumerate() {
        if !matches_year(row.get(CHRONIC_YEAR_COLUMN), year) {
            continue;
        }
        let Some(region) = region_name(row.get(CHRONIC_REGION_COLUMN)) else {
            continue;
        };
        let consumption = match row.get(CHRONIC_CONSUMPTION_COLUMN) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        match parse_number_like(consumption).filter(|value| value.is_finite()) {
            Some(value) => aggregate.set_region(&region, round4(value)),
            None => {
                warn!(
                    row = index,
                    year,
                    region = %region,
                    value = %consumption,
                    "Skipping chronic row with non-numeric per-capita consumption"
                );
            }
        }
    }

    aggregate
}

fn matches_year(value: Option<&Value>, year: i64) -> bool {
    value
        .and_then(parse_number_like)
        .map(|parsed| parsed == year as f64)
        .unwrap_or(false)
}

fn region_name(value: Option<&Value>) -> Option<String> {
    let name = match value? {
        Value::Null => return None,
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::REGIONS;
    use serde_json::json;

    fn row(year: Value, region: Value, pc: Value) -> Row {
        json!({ "ANO_POF": year, "Região": region, "PC (kg)": pc })
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_six_regions_rounded_to_four_decimals() {
        let rows: Vec<Row> = REGIONS
            .iter()
            .enumerate()
            .map(|(i, region)| row(json!(2008), json!(region), json!(60.123456 + i as f64)))
            .collect();

        let aggregate = build_year_aggregate(&rows, 2008);

        assert_eq!(aggregate.per_capita_kg.len(), 6);
        assert_eq!(aggregate.per_capita_kg["Brasil"], Some(60.1235));
        assert_eq!(aggregate.per_capita_kg["Sul"], Some(65.1235));
        assert!(aggregate.ida_external.values().all(Option::is_none));
        assert!(aggregate.ida_internal.values().all(Option::is_none));
        assert_eq!(aggregate.ida_external.len(), 6);
    }

    #[test]
    fn test_wrong_year_and_null_region_are_excluded() {
        let rows = vec![
            row(json!(2017), json!("Norte"), json!(55.0)),
            row(json!(2008), json!(null), json!(55.0)),
            row(json!(2008), json!(""), json!(55.0)),
            row(json!(2008.0), json!("Sul"), json!(70.5)),
        ];

        let aggregate = build_year_aggregate(&rows, 2008);

        assert_eq!(aggregate.per_capita_kg.len(), 1);
        assert_eq!(aggregate.per_capita_kg["Sul"], Some(70.5));
    }

    #[test]
    fn test_malformed_consumption_is_skipped() {
        let rows = vec![
            row(json!(2008), json!("Norte"), json!("abc")),
            row(json!(2008), json!("Sul"), json!(null)),
            row(json!(2008), json!("Nordeste"), json!("58,25")),
        ];

        let aggregate = build_year_aggregate(&rows, 2008);

        assert_eq!(aggregate.per_capita_kg.len(), 1);
        assert_eq!(aggregate.per_capita_kg["Nordeste"], Some(58.25));
    }

    #[test]
    fn test_duplicate_region_last_row_wins() {
        let rows = vec![
            row(json!(2017), json!("Sudeste"), json!(1.0)),
            row(json!(2017), json!("Sudeste"), json!(2.0)),
        ];
        let aggregates = build_chronic_aggregates(&rows);
        assert_eq!(aggregates.pof_2017.per_capita_kg["Sudeste"], Some(2.0));
        assert!(aggregates.pof_2008.is_empty());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round4(0.00005), 0.0001);
        assert_eq!(round4(-0.00005), -0.0001);
        assert_eq!(round4(1.23456789), 1.2346);
    }
}

//! JSON fixture loading (the raw data provider)
//!
//! Numeric cells may be numbers or strings; anything unusable becomes zero.
//! Unknown line-item keys are skipped with a warning rather than failing the
//! whole file.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::consolidated::{BusinessCashFlow, ConsolidatedCashFlow};
use crate::line_items::LineItem;
use crate::ownership::Ownership;
use crate::parse::number_from_json;
use crate::periods::{Period, PeriodSeries};

/// Period analysis file
#[derive(Debug, Deserialize)]
struct AnalysisFile {
    periods: Vec<Period>,
    #[serde(default)]
    line_items: BTreeMap<String, Vec<Value>>,
}

/// Consolidated rollup file
#[derive(Debug, Deserialize)]
struct ConsolidatedFile {
    years: Vec<String>,
    #[serde(default)]
    businesses: Vec<BusinessFile>,
    #[serde(default)]
    required_officer_comp: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct BusinessFile {
    name: String,
    #[serde(default = "default_selected")]
    selected: bool,
    #[serde(default)]
    years: BTreeMap<String, BTreeMap<String, Value>>,
}

fn default_selected() -> bool {
    true
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read fixture: {}", path.display()))
}

fn line_item_or_warn(key: &str, context: &str) -> Option<LineItem> {
    match key.parse::<LineItem>() {
        Ok(item) => Some(item),
        Err(_) => {
            warn!(key, context, "Skipping unknown line item");
            None
        }
    }
}

pub fn load_period_series(path: &Path) -> Result<PeriodSeries> {
    parse_period_series(&read(path)?).with_context(|| format!("Invalid analysis file: {}", path.display()))
}

pub fn parse_period_series(content: &str) -> Result<PeriodSeries> {
    let file: AnalysisFile = serde_json::from_str(content)?;
    let mut store = PeriodSeries::new(file.periods);

    for (key, values) in &file.line_items {
        let Some(item) = line_item_or_warn(key, "analysis") else {
            continue;
        };
        store.insert_padded(item, values.iter().map(number_from_json).collect());
    }

    debug!(
        periods = store.len(),
        items = store.items().count(),
        "Loaded period series"
    );
    Ok(store)
}

pub fn load_consolidated(path: &Path) -> Result<ConsolidatedCashFlow> {
    parse_consolidated(&read(path)?).with_context(|| format!("Invalid consolidated file: {}", path.display()))
}

pub fn parse_consolidated(content: &str) -> Result<ConsolidatedCashFlow> {
    let file: ConsolidatedFile = serde_json::from_str(content)?;
    let mut rollup = ConsolidatedCashFlow::new(file.years);

    for raw in file.businesses {
        let mut business = BusinessCashFlow::new(raw.name);
        business.selected = raw.selected;
        for (year, items) in &raw.years {
            if !rollup.years().contains(year) {
                warn!(business = %business.name, year = %year, "Business has data for a year outside the rollup");
            }
            for (key, value) in items {
                if let Some(item) = line_item_or_warn(key, &business.name) {
                    business.set(year, item, number_from_json(value));
                }
            }
        }
        rollup.add_business(business);
    }

    for (year, value) in &file.required_officer_comp {
        let input = match value {
            Value::String(s) => s.clone(),
            other => number_from_json(other).to_string(),
        };
        rollup
            .set_required_officer_comp(year, &input)
            .with_context(|| format!("required_officer_comp entry for {}", year))?;
    }

    debug!(
        years = rollup.years().len(),
        businesses = rollup.businesses().len(),
        "Loaded consolidated cash flow"
    );
    Ok(rollup)
}

pub fn load_ownership(path: &Path) -> Result<Ownership> {
    let content = read(path)?;
    serde_json::from_str(&content).with_context(|| {
        format!(
            "Invalid ownership file: {}\n\
             Each owner needs a name and a citizenship status; dates use YYYY-MM-DD.",
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::PeriodType;

    #[test]
    fn test_parse_period_series() {
        let json = r#"{
            "periods": [
                {"date": "2022-12-31", "type": "Annual", "months": 12},
                {"date": "2023-06-30", "type": "Interim", "months": 6}
            ],
            "line_items": {
                "gross_revenue": [100000, "125,000"],
                "cogs": [40000],
                "mystery_row": [1, 2],
                "wages": ["n/a", null]
            }
        }"#;
        let store = parse_period_series(json).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.periods()[1].period_type, PeriodType::Interim);
        assert_eq!(store.series(LineItem::GrossRevenue), vec![100_000.0, 125_000.0]);
        assert_eq!(store.series(LineItem::Cogs), vec![40_000.0, 0.0]);
        assert_eq!(store.series(LineItem::Wages), vec![0.0, 0.0]);
        assert_eq!(store.items().count(), 3);
    }

    #[test]
    fn test_period_defaults() {
        let store = parse_period_series(r#"{"periods": [{"date": "2023-12-31"}]}"#).unwrap();
        assert_eq!(store.periods()[0], Period::annual("2023-12-31"));
    }

    #[test]
    fn test_parse_consolidated() {
        let json = r#"{
            "years": ["2022", "2023"],
            "businesses": [
                {"name": "OpCo", "years": {"2023": {"gross_revenue": 100, "existing_debt": "10"}}},
                {"name": "EPC", "selected": false, "years": {"2023": {"gross_revenue": 100}}},
                {"name": "HoldCo", "years": {"2023": {"gross_revenue": "100", "bogus": 5}}}
            ],
            "required_officer_comp": {"2023": 25000, "2022": "$10,000"}
        }"#;
        let rollup = parse_consolidated(json).unwrap();
        assert_eq!(rollup.businesses().len(), 3);
        assert_eq!(rollup.aggregate("2023", LineItem::GrossRevenue), 200.0);
        assert_eq!(rollup.aggregate_debt_service("2023"), 10.0);
        assert_eq!(rollup.required_officer_comp("2023"), 25_000.0);
        assert_eq!(rollup.required_officer_comp("2022"), 10_000.0);
    }

    #[test]
    fn test_consolidated_roc_for_unknown_year_fails() {
        let json = r#"{"years": ["2023"], "required_officer_comp": {"2019": 1}}"#;
        assert!(parse_consolidated(json).is_err());
    }

    #[test]
    fn test_load_ownership_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owners.json");
        std::fs::write(
            &path,
            r#"{"current_owners": [
                {"name": "Ana", "ownership_percentage": 60, "citizenship_status": "U.S. Citizen"},
                {"name": "Ben", "ownership_percentage": 40, "citizenship_status": "Lawful Permanent Resident"}
            ]}"#,
        )
        .unwrap();
        let ownership = load_ownership(&path).unwrap();
        assert_eq!(ownership.current_owners.len(), 2);
        assert!(ownership.former_owners.is_empty());
        assert!(!ownership.total_ownership().mismatch);
    }

    #[test]
    fn test_ownership_percentages_coerced_leniently() {
        let json = r#"{
            "current_owners": [
                {"name": "Ana", "ownership_percentage": "60", "citizenship_status": "U.S. Citizen"},
                {"name": "Ben", "ownership_percentage": "39.5%", "citizenship_status": "U.S. Citizen"},
                {"name": "Cal", "ownership_percentage": null, "citizenship_status": "U.S. Citizen"}
            ],
            "former_owners": [
                {"name": "Dee", "ownership_percentage": "$0", "citizenship_status": "U.S. Citizen"}
            ]
        }"#;
        let ownership: Ownership = serde_json::from_str(json).unwrap();
        let percentages: Vec<f64> = ownership
            .current_owners
            .iter()
            .map(|o| o.ownership_percentage)
            .collect();
        assert_eq!(percentages, vec![60.0, 0.0, 0.0]);
        assert_eq!(ownership.former_owners[0].owner.ownership_percentage, 0.0);
        assert_eq!(ownership.total_ownership().difference, 40.0);
    }

    #[test]
    fn test_partial_noi_override_falls_back_per_period() {
        let json = r#"{
            "periods": [{"date": "2022-12-31"}, {"date": "2023-12-31"}],
            "line_items": {
                "net_income": [100000, 120000],
                "noi": [90000]
            }
        }"#;
        let store = parse_period_series(json).unwrap();
        assert_eq!(crate::metrics::noi(&store.at(0)), 90_000.0);
        assert_eq!(crate::metrics::noi(&store.at(1)), 120_000.0);
    }

    #[test]
    fn test_demo_fixtures_load() {
        let store = parse_period_series(include_str!("../../../demos/analysis.json")).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(LineItem::OtherDebt, 0), 0.0);
        assert_eq!(store.get(LineItem::OtherDebt, 1), 6_000.0);

        let rollup = parse_consolidated(include_str!("../../../demos/consolidated.json")).unwrap();
        assert_eq!(rollup.selected().count(), 2);
        assert_eq!(rollup.required_officer_comp("2023"), 80_000.0);

        let ownership: Ownership = serde_json::from_str(include_str!("../../../demos/owners.json")).unwrap();
        assert_eq!(ownership.former_owners.len(), 1);
        assert_eq!(ownership.total_ownership().difference, 5.0);
    }

    #[test]
    fn test_missing_fixture_file() {
        assert!(load_period_series(Path::new("/definitely/not/here.json")).is_err());
    }
}

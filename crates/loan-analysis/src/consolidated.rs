//! Consolidated cash flow across several businesses
//!
//! Line items are summed over the selected businesses for each year, then the
//! same NOI / debt-service derivations used by the period table are applied
//! to the totals. Required officer compensation is entered per year for the
//! whole group rather than summed from the businesses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;

use crate::constants;
use crate::error::{AnalysisError, Result};
use crate::format::{format_currency, format_ratio};
use crate::line_items::LineItem;
use crate::metrics::{self, LineItemSource};
use crate::parse::{parse_number_or_default, sanitize};

// =============================================================================
// Coverage classification
// =============================================================================

/// Strength band of a debt service coverage ratio
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DscrStrength {
    Strong,
    Adequate,
    Insufficient,
}

impl DscrStrength {
    /// Classify with the standard bands (1.25 / 1.00, lower bound inclusive)
    pub fn classify(ratio: f64) -> Self {
        DscrThresholds::default().classify(ratio)
    }
}

impl std::fmt::Display for DscrStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DscrStrength::Strong => write!(f, "strong"),
            DscrStrength::Adequate => write!(f, "adequate"),
            DscrStrength::Insufficient => write!(f, "insufficient"),
        }
    }
}

/// Lower bounds of the strong and adequate bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DscrThresholds {
    pub strong: f64,
    pub adequate: f64,
}

impl Default for DscrThresholds {
    fn default() -> Self {
        Self {
            strong: constants::DSCR_STRONG_THRESHOLD,
            adequate: constants::DSCR_ADEQUATE_THRESHOLD,
        }
    }
}

impl DscrThresholds {
    pub fn classify(&self, ratio: f64) -> DscrStrength {
        if ratio >= self.strong {
            DscrStrength::Strong
        } else if ratio >= self.adequate {
            DscrStrength::Adequate
        } else {
            DscrStrength::Insufficient
        }
    }
}

// =============================================================================
// Businesses
// =============================================================================

/// Yearly line items of one business
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessCashFlow {
    pub name: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
    #[serde(default)]
    pub years: BTreeMap<String, BTreeMap<LineItem, f64>>,
}

fn default_selected() -> bool {
    true
}

impl BusinessCashFlow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: true,
            years: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, year: &str, item: LineItem, value: f64) -> Self {
        self.set(year, item, value);
        self
    }

    pub fn set(&mut self, year: &str, item: LineItem, value: f64) {
        self.years
            .entry(year.to_string())
            .or_default()
            .insert(item, sanitize(value));
    }

    pub fn value(&self, year: &str, item: LineItem) -> f64 {
        self.years
            .get(year)
            .and_then(|items| items.get(&item))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn year(&self, year: &str) -> BusinessYear<'_> {
        BusinessYear {
            business: self,
            year: year.to_string(),
        }
    }
}

/// One business in one year
pub struct BusinessYear<'a> {
    business: &'a BusinessCashFlow,
    year: String,
}

impl LineItemSource for BusinessYear<'_> {
    fn value(&self, item: LineItem) -> f64 {
        self.business.value(&self.year, item)
    }

    fn has(&self, item: LineItem) -> bool {
        self.business
            .years
            .get(&self.year)
            .is_some_and(|items| items.contains_key(&item))
    }
}

// =============================================================================
// Rollup
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ConsolidatedCashFlow {
    years: Vec<String>,
    businesses: Vec<BusinessCashFlow>,
    required_officer_comp: BTreeMap<String, f64>,
}

/// Aggregate figures for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: String,
    pub gross_revenue: f64,
    pub noi: f64,
    pub debt_service: f64,
    pub required_officer_comp: f64,
    pub dscr: f64,
    pub dscr_post_roc: f64,
    pub strength: DscrStrength,
}

impl ConsolidatedCashFlow {
    pub fn new(years: Vec<String>) -> Self {
        Self {
            years,
            ..Default::default()
        }
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn businesses(&self) -> &[BusinessCashFlow] {
        &self.businesses
    }

    pub fn add_business(&mut self, business: BusinessCashFlow) {
        self.businesses.push(business);
    }

    /// Include or exclude a business from the totals
    pub fn select(&mut self, name: &str, selected: bool) -> Result<()> {
        let business = self
            .businesses
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| AnalysisError::UnknownBusiness(name.to_string()))?;
        business.selected = selected;
        Ok(())
    }

    /// Keep only the named businesses selected
    pub fn select_only(&mut self, names: &[String]) -> Result<()> {
        if let Some(missing) = names
            .iter()
            .find(|n| !self.businesses.iter().any(|b| &b.name == *n))
        {
            return Err(AnalysisError::UnknownBusiness(missing.clone()));
        }
        for business in &mut self.businesses {
            business.selected = names.contains(&business.name);
        }
        Ok(())
    }

    pub fn selected(&self) -> impl Iterator<Item = &BusinessCashFlow> {
        self.businesses.iter().filter(|b| b.selected)
    }

    /// Sum of a line item across the selected businesses
    pub fn aggregate(&self, year: &str, item: LineItem) -> f64 {
        self.selected().map(|b| b.value(year, item)).sum()
    }

    pub fn required_officer_comp(&self, year: &str) -> f64 {
        self.required_officer_comp.get(year).copied().unwrap_or(0.0)
    }

    /// Edit the group's required officer compensation for a year; invalid
    /// input is stored as zero
    pub fn set_required_officer_comp(&mut self, year: &str, input: &str) -> Result<f64> {
        if !self.years.iter().any(|y| y == year) {
            return Err(AnalysisError::UnknownYear(year.to_string()));
        }
        let value = parse_number_or_default(input, 0.0);
        self.required_officer_comp.insert(year.to_string(), value);
        debug!(year, value, "Set required officer compensation");
        Ok(value)
    }

    pub fn view(&self, year: &str) -> YearAggregate<'_> {
        YearAggregate {
            rollup: self,
            year: year.to_string(),
        }
    }

    pub fn aggregate_noi(&self, year: &str) -> f64 {
        metrics::noi(&self.view(year))
    }

    pub fn aggregate_debt_service(&self, year: &str) -> f64 {
        metrics::debt_service(&self.view(year))
    }

    pub fn dscr(&self, year: &str) -> f64 {
        metrics::dsc_pre_oc(&self.view(year))
    }

    pub fn dscr_post_roc(&self, year: &str) -> f64 {
        metrics::dsc_post_oc(&self.view(year))
    }

    pub fn summary(&self, year: &str, thresholds: &DscrThresholds) -> YearSummary {
        let dscr_post_roc = self.dscr_post_roc(year);
        YearSummary {
            year: year.to_string(),
            gross_revenue: self.aggregate(year, LineItem::GrossRevenue),
            noi: self.aggregate_noi(year),
            debt_service: self.aggregate_debt_service(year),
            required_officer_comp: self.required_officer_comp(year),
            dscr: self.dscr(year),
            dscr_post_roc,
            strength: thresholds.classify(dscr_post_roc),
        }
    }

    pub fn summaries(&self, thresholds: &DscrThresholds) -> Vec<YearSummary> {
        self.years
            .iter()
            .map(|year| self.summary(year, thresholds))
            .collect()
    }

    /// Render the yearly totals for the console
    pub fn render(&self, thresholds: &DscrThresholds) -> String {
        let summaries = self.summaries(thresholds);
        let mut builder = Builder::default();

        let mut header = vec!["".to_string()];
        header.extend(summaries.iter().map(|s| s.year.clone()));
        builder.push_record(header);

        let rows: [(&str, fn(&YearSummary) -> String); 7] = [
            ("Gross Revenue", |s| format_currency(s.gross_revenue)),
            ("Net Operating Income", |s| format_currency(s.noi)),
            ("Total Debt Service", |s| format_currency(s.debt_service)),
            ("DSCR", |s| format_ratio(s.dscr)),
            ("Required Officer Comp", |s| format_currency(s.required_officer_comp)),
            ("DSCR after ROC", |s| format_ratio(s.dscr_post_roc)),
            ("Coverage", |s| s.strength.to_string()),
        ];
        for (label, cell) in rows {
            let mut record = vec![label.to_string()];
            record.extend(summaries.iter().map(cell));
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

/// Totals of the selected businesses for one year
pub struct YearAggregate<'a> {
    rollup: &'a ConsolidatedCashFlow,
    year: String,
}

impl LineItemSource for YearAggregate<'_> {
    fn value(&self, item: LineItem) -> f64 {
        match item {
            LineItem::RequiredOfficerComp => self.rollup.required_officer_comp(&self.year),
            // Each business resolves its own NOI override before summing
            LineItem::Noi => self
                .rollup
                .selected()
                .map(|b| metrics::noi(&b.year(&self.year)))
                .sum(),
            _ => self.rollup.aggregate(&self.year, item),
        }
    }

    fn has(&self, item: LineItem) -> bool {
        item == LineItem::Noi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollup() -> ConsolidatedCashFlow {
        let mut rollup = ConsolidatedCashFlow::new(vec!["2022".to_string(), "2023".to_string()]);
        rollup.add_business(
            BusinessCashFlow::new("Main Street Bakery")
                .with_value("2023", LineItem::GrossRevenue, 100.0)
                .with_value("2023", LineItem::NetIncome, 90_000.0)
                .with_value("2023", LineItem::Depreciation, 10_000.0)
                .with_value("2023", LineItem::ProposedDebt, 60_000.0),
        );
        rollup.add_business(
            BusinessCashFlow::new("Bakery Real Estate LLC")
                .with_value("2023", LineItem::GrossRevenue, 100.0)
                .with_value("2023", LineItem::Noi, 50_000.0)
                .with_value("2023", LineItem::NetIncome, 1_000_000.0)
                .with_value("2023", LineItem::ExistingDebt, 40_000.0),
        );
        rollup
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(DscrStrength::classify(1.30), DscrStrength::Strong);
        assert_eq!(DscrStrength::classify(1.10), DscrStrength::Adequate);
        assert_eq!(DscrStrength::classify(0.95), DscrStrength::Insufficient);
    }

    #[test]
    fn test_classify_boundaries_belong_to_higher_band() {
        assert_eq!(DscrStrength::classify(1.25), DscrStrength::Strong);
        assert_eq!(DscrStrength::classify(1.00), DscrStrength::Adequate);
        assert_eq!(DscrStrength::classify(1.24), DscrStrength::Adequate);
        assert_eq!(DscrStrength::classify(0.99), DscrStrength::Insufficient);
        assert_eq!(DscrStrength::classify(0.0), DscrStrength::Insufficient);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = DscrThresholds {
            strong: 1.5,
            adequate: 1.15,
        };
        assert_eq!(thresholds.classify(1.30), DscrStrength::Adequate);
        assert_eq!(thresholds.classify(1.10), DscrStrength::Insufficient);
    }

    #[test]
    fn test_aggregate_sums_selected_businesses() {
        let rollup = rollup();
        assert_eq!(rollup.aggregate("2023", LineItem::GrossRevenue), 200.0);
        assert_eq!(rollup.aggregate("2022", LineItem::GrossRevenue), 0.0);
    }

    #[test]
    fn test_deselected_business_excluded() {
        let mut rollup = rollup();
        rollup.select("Bakery Real Estate LLC", false).unwrap();
        assert_eq!(rollup.aggregate("2023", LineItem::GrossRevenue), 100.0);
        assert_eq!(
            rollup.select("Nope", true),
            Err(AnalysisError::UnknownBusiness("Nope".to_string()))
        );
    }

    #[test]
    fn test_select_only() {
        let mut rollup = rollup();
        rollup.select_only(&["Main Street Bakery".to_string()]).unwrap();
        assert_eq!(rollup.selected().count(), 1);
        assert!(rollup.select_only(&["Missing".to_string()]).is_err());
        // A failed selection leaves the previous one intact
        assert_eq!(rollup.selected().count(), 1);
    }

    #[test]
    fn test_aggregate_noi_respects_per_business_override() {
        let rollup = rollup();
        // 90k + 10k from the first business, 50k override from the second
        assert_eq!(rollup.aggregate_noi("2023"), 150_000.0);
        assert_eq!(rollup.aggregate_debt_service("2023"), 100_000.0);
        assert_eq!(rollup.dscr("2023"), 1.5);
    }

    #[test]
    fn test_dscr_post_roc_uses_yearly_input() {
        let mut rollup = rollup();
        rollup.set_required_officer_comp("2023", "$30,000").unwrap();
        assert_eq!(rollup.dscr_post_roc("2023"), 1.2);

        let summary = rollup.summary("2023", &DscrThresholds::default());
        assert_eq!(summary.strength, DscrStrength::Adequate);
        assert_eq!(summary.required_officer_comp, 30_000.0);
    }

    #[test]
    fn test_roc_invalid_input_and_unknown_year() {
        let mut rollup = rollup();
        assert_eq!(rollup.set_required_officer_comp("2023", "lots"), Ok(0.0));
        assert_eq!(
            rollup.set_required_officer_comp("1999", "5"),
            Err(AnalysisError::UnknownYear("1999".to_string()))
        );
    }

    #[test]
    fn test_zero_debt_guards() {
        let rollup = rollup();
        assert_eq!(rollup.dscr("2022"), 0.0);
        assert_eq!(rollup.dscr_post_roc("2022"), 0.0);
        let summary = rollup.summary("2022", &DscrThresholds::default());
        assert_eq!(summary.strength, DscrStrength::Insufficient);
    }

    #[test]
    fn test_render_lists_years() {
        let rendered = rollup().render(&DscrThresholds::default());
        assert!(rendered.contains("2022"));
        assert!(rendered.contains("2023"));
        assert!(rendered.contains("1.50x"));
    }
}

//! Row keys for the cash-flow analysis
//!
//! Raw line items are the values a lender types in or imports; derived
//! metrics are computed from them and are never edited directly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AnalysisError;

/// Raw, editable line item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    GrossRevenue,
    Cogs,
    Wages,
    OperatingExpenses,
    NetIncome,
    Interest,
    Depreciation,
    Amortization,
    OfficerCompensation,
    OtherAddbacks,
    /// Externally computed NOI; overrides the contributor sum when present
    Noi,
    RequiredOfficerComp,
    Distributions,
    ExistingDebt,
    ProposedDebt,
    OtherDebt,
}

impl LineItem {
    pub const ALL: [LineItem; 16] = [
        LineItem::GrossRevenue,
        LineItem::Cogs,
        LineItem::Wages,
        LineItem::OperatingExpenses,
        LineItem::NetIncome,
        LineItem::Interest,
        LineItem::Depreciation,
        LineItem::Amortization,
        LineItem::OfficerCompensation,
        LineItem::OtherAddbacks,
        LineItem::Noi,
        LineItem::RequiredOfficerComp,
        LineItem::Distributions,
        LineItem::ExistingDebt,
        LineItem::ProposedDebt,
        LineItem::OtherDebt,
    ];

    /// Rows summed into debt service
    pub const DEBT_PAYMENTS: [LineItem; 3] =
        [LineItem::ExistingDebt, LineItem::ProposedDebt, LineItem::OtherDebt];

    /// Rows summed into NOI when no NOI override is supplied
    pub const NOI_CONTRIBUTORS: [LineItem; 6] = [
        LineItem::NetIncome,
        LineItem::Interest,
        LineItem::Depreciation,
        LineItem::Amortization,
        LineItem::OfficerCompensation,
        LineItem::OtherAddbacks,
    ];

    /// Stable key used in fixtures, CSV headers and edit commands
    pub fn key(self) -> &'static str {
        match self {
            LineItem::GrossRevenue => "gross_revenue",
            LineItem::Cogs => "cogs",
            LineItem::Wages => "wages",
            LineItem::OperatingExpenses => "operating_expenses",
            LineItem::NetIncome => "net_income",
            LineItem::Interest => "interest",
            LineItem::Depreciation => "depreciation",
            LineItem::Amortization => "amortization",
            LineItem::OfficerCompensation => "officer_compensation",
            LineItem::OtherAddbacks => "other_addbacks",
            LineItem::Noi => "noi",
            LineItem::RequiredOfficerComp => "required_officer_comp",
            LineItem::Distributions => "distributions",
            LineItem::ExistingDebt => "existing_debt",
            LineItem::ProposedDebt => "proposed_debt",
            LineItem::OtherDebt => "other_debt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LineItem::GrossRevenue => "Gross Revenue",
            LineItem::Cogs => "Cost of Goods Sold",
            LineItem::Wages => "Wages",
            LineItem::OperatingExpenses => "Operating Expenses",
            LineItem::NetIncome => "Net Income",
            LineItem::Interest => "Interest",
            LineItem::Depreciation => "Depreciation",
            LineItem::Amortization => "Amortization",
            LineItem::OfficerCompensation => "Officer Compensation",
            LineItem::OtherAddbacks => "Other Addbacks",
            LineItem::Noi => "NOI (override)",
            LineItem::RequiredOfficerComp => "Required Officer Comp",
            LineItem::Distributions => "Distributions",
            LineItem::ExistingDebt => "Existing Debt",
            LineItem::ProposedDebt => "Proposed Debt",
            LineItem::OtherDebt => "Other Debt",
        }
    }

    pub fn is_debt_payment(self) -> bool {
        Self::DEBT_PAYMENTS.contains(&self)
    }
}

impl std::fmt::Display for LineItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for LineItem {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        LineItem::ALL
            .into_iter()
            .find(|item| item.key() == key)
            .ok_or_else(|| AnalysisError::UnknownLineItem(key.to_string()))
    }
}

/// Value computed from raw line items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    GrossProfit,
    GrossMargin,
    Noi,
    DebtService,
    DscPreOc,
    DscPostOc,
    AvailableCf,
    ExcessCf,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 8] = [
        DerivedMetric::GrossProfit,
        DerivedMetric::GrossMargin,
        DerivedMetric::Noi,
        DerivedMetric::DebtService,
        DerivedMetric::DscPreOc,
        DerivedMetric::DscPostOc,
        DerivedMetric::AvailableCf,
        DerivedMetric::ExcessCf,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DerivedMetric::GrossProfit => "gross_profit",
            DerivedMetric::GrossMargin => "gross_margin",
            DerivedMetric::Noi => "noi_total",
            DerivedMetric::DebtService => "debt_service",
            DerivedMetric::DscPreOc => "dsc_pre_oc",
            DerivedMetric::DscPostOc => "dsc_post_oc",
            DerivedMetric::AvailableCf => "available_cf",
            DerivedMetric::ExcessCf => "excess_cf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DerivedMetric::GrossProfit => "Gross Profit",
            DerivedMetric::GrossMargin => "Gross Margin",
            DerivedMetric::Noi => "Net Operating Income",
            DerivedMetric::DebtService => "Total Debt Service",
            DerivedMetric::DscPreOc => "DSC (pre-OC)",
            DerivedMetric::DscPostOc => "DSC (post-OC)",
            DerivedMetric::AvailableCf => "Available Cash Flow",
            DerivedMetric::ExcessCf => "Excess Cash Flow",
        }
    }

    /// How the value is displayed
    pub fn unit(self) -> Unit {
        match self {
            DerivedMetric::GrossMargin => Unit::Percent,
            DerivedMetric::DscPreOc | DerivedMetric::DscPostOc => Unit::Ratio,
            _ => Unit::Currency,
        }
    }
}

/// Display unit of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Currency,
    Percent,
    Ratio,
}

/// Any row of the analysis table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Raw(LineItem),
    Derived(DerivedMetric),
}

impl RowKey {
    pub fn key(self) -> &'static str {
        match self {
            RowKey::Raw(item) => item.key(),
            RowKey::Derived(metric) => metric.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowKey::Raw(item) => item.label(),
            RowKey::Derived(metric) => metric.label(),
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            RowKey::Raw(_) => Unit::Currency,
            RowKey::Derived(metric) => metric.unit(),
        }
    }

    /// Only raw rows accept edits
    pub fn is_editable(self) -> bool {
        matches!(self, RowKey::Raw(_))
    }
}

impl FromStr for RowKey {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if let Some(metric) = DerivedMetric::ALL.into_iter().find(|m| m.key() == key) {
            return Ok(RowKey::Derived(metric));
        }
        key.parse().map(RowKey::Raw)
    }
}

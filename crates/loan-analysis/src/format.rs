//! Display formatting for table cells
//!
//! Currency, percentages and ratios, change indicators, and the tooltip text
//! that explains how a derived value was built. Non-finite input always
//! renders as the empty-cell placeholder.

use crate::constants;
use crate::line_items::{DerivedMetric, LineItem, Unit};
use crate::metrics::{self, LineItemSource};

/// Whole dollars with thousands separators: `$1,234`, `-$1,234`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return constants::EMPTY_CELL.to_string();
    }
    let rounded = value.round();
    if rounded.abs() >= u64::MAX as f64 {
        return constants::EMPTY_CELL.to_string();
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

/// One decimal place: `12.5%`
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return constants::EMPTY_CELL.to_string();
    }
    format!("{:.1}%", normalize_zero(value))
}

/// Coverage ratio: `1.25x`
pub fn format_ratio(value: f64) -> String {
    if !value.is_finite() {
        return constants::EMPTY_CELL.to_string();
    }
    format!("{:.2}x", normalize_zero(value))
}

pub fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Currency => format_currency(value),
        Unit::Percent => format_percent(value),
        Unit::Ratio => format_ratio(value),
    }
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let group = n % 1000;
        n /= 1000;
        if n == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{:03}", group));
    }
    groups.reverse();
    groups.join(",")
}

/// Direction arrow shown next to a period-over-period change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeIndicator {
    Up,
    Down,
    Flat,
}

impl ChangeIndicator {
    /// `None` when there is no change to show
    pub fn from_change(change: Option<f64>) -> Option<Self> {
        let change = change.filter(|c| c.is_finite())?;
        Some(if change > 0.0 {
            ChangeIndicator::Up
        } else if change < 0.0 {
            ChangeIndicator::Down
        } else {
            ChangeIndicator::Flat
        })
    }

    pub fn arrow(self) -> &'static str {
        match self {
            ChangeIndicator::Up => "▲",
            ChangeIndicator::Down => "▼",
            ChangeIndicator::Flat => "►",
        }
    }
}

/// `▲ 12.5%`, or an empty string when no indicator applies
pub fn format_change(change: Option<f64>) -> String {
    match (ChangeIndicator::from_change(change), change) {
        (Some(indicator), Some(pct)) => format!("{} {:.1}%", indicator.arrow(), pct.abs()),
        _ => String::new(),
    }
}

/// Human explanation of how a derived value was computed for one period
pub fn tooltip(metric: DerivedMetric, src: &impl LineItemSource) -> String {
    let noi = metrics::noi(src);
    let debt = metrics::debt_service(src);
    let roc = src.value(LineItem::RequiredOfficerComp);

    match metric {
        DerivedMetric::GrossProfit => format!(
            "Gross Revenue {} - COGS {} = {}",
            format_currency(src.value(LineItem::GrossRevenue)),
            format_currency(src.value(LineItem::Cogs)),
            format_currency(metrics::gross_profit(src)),
        ),
        DerivedMetric::GrossMargin => format!(
            "Gross Profit {} / Gross Revenue {} = {}",
            format_currency(metrics::gross_profit(src)),
            format_currency(src.value(LineItem::GrossRevenue)),
            format_percent(metrics::gross_margin(src)),
        ),
        DerivedMetric::Noi => {
            if src.has(LineItem::Noi) {
                format!("NOI supplied directly: {}", format_currency(noi))
            } else {
                let parts: Vec<String> = LineItem::NOI_CONTRIBUTORS
                    .iter()
                    .map(|item| format!("{} {}", item.label(), format_currency(src.value(*item))))
                    .collect();
                format!("{} = {}", parts.join(" + "), format_currency(noi))
            }
        }
        DerivedMetric::DebtService => {
            let parts: Vec<String> = LineItem::DEBT_PAYMENTS
                .iter()
                .map(|item| format!("{} {}", item.label(), format_currency(src.value(*item))))
                .collect();
            format!("{} = {}", parts.join(" + "), format_currency(debt))
        }
        DerivedMetric::DscPreOc => format!(
            "NOI {} / Debt Service {} = {}",
            format_currency(noi),
            format_currency(debt),
            format_ratio(metrics::dsc_pre_oc(src)),
        ),
        DerivedMetric::DscPostOc => format!(
            "(NOI {} - Required Officer Comp {}) / Debt Service {} = {}",
            format_currency(noi),
            format_currency(roc),
            format_currency(debt),
            format_ratio(metrics::dsc_post_oc(src)),
        ),
        DerivedMetric::AvailableCf => format!(
            "NOI {} - Required Officer Comp {} - Distributions {} = {}",
            format_currency(noi),
            format_currency(roc),
            format_currency(src.value(LineItem::Distributions)),
            format_currency(metrics::available_cf(src)),
        ),
        DerivedMetric::ExcessCf => format!(
            "Available Cash Flow {} - Debt Service {} = {}",
            format_currency(metrics::available_cf(src)),
            format_currency(debt),
            format_currency(metrics::excess_cf(src)),
        ),
    }
}

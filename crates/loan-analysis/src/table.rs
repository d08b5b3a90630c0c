//! Cash-flow analysis table assembly
//!
//! Rows are laid out in fixed display groups. The table is rebuilt from the
//! store every time it is read, so edits show up on the next build.

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::format::{format_change, format_value, tooltip};
use crate::line_items::{DerivedMetric, LineItem, RowKey};
use crate::metrics::{period_change, row_value};
use crate::periods::PeriodSeries;

/// Display group of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowGroup {
    Revenue,
    OperatingExpenses,
    IncomeAndAddbacks,
    DebtService,
    Coverage,
    CashFlow,
}

impl std::fmt::Display for RowGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowGroup::Revenue => write!(f, "Revenue"),
            RowGroup::OperatingExpenses => write!(f, "Operating Expenses"),
            RowGroup::IncomeAndAddbacks => write!(f, "Income & Addbacks"),
            RowGroup::DebtService => write!(f, "Debt Service"),
            RowGroup::Coverage => write!(f, "Coverage"),
            RowGroup::CashFlow => write!(f, "Cash Flow"),
        }
    }
}

/// Fixed row order of the analysis table
pub const ROW_LAYOUT: &[(RowGroup, RowKey)] = &[
    (RowGroup::Revenue, RowKey::Raw(LineItem::GrossRevenue)),
    (RowGroup::Revenue, RowKey::Raw(LineItem::Cogs)),
    (RowGroup::Revenue, RowKey::Derived(DerivedMetric::GrossProfit)),
    (RowGroup::Revenue, RowKey::Derived(DerivedMetric::GrossMargin)),
    (RowGroup::OperatingExpenses, RowKey::Raw(LineItem::Wages)),
    (RowGroup::OperatingExpenses, RowKey::Raw(LineItem::OperatingExpenses)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::NetIncome)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::Interest)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::Depreciation)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::Amortization)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::OfficerCompensation)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::OtherAddbacks)),
    (RowGroup::IncomeAndAddbacks, RowKey::Raw(LineItem::Noi)),
    (RowGroup::IncomeAndAddbacks, RowKey::Derived(DerivedMetric::Noi)),
    (RowGroup::DebtService, RowKey::Raw(LineItem::ExistingDebt)),
    (RowGroup::DebtService, RowKey::Raw(LineItem::ProposedDebt)),
    (RowGroup::DebtService, RowKey::Raw(LineItem::OtherDebt)),
    (RowGroup::DebtService, RowKey::Derived(DerivedMetric::DebtService)),
    (RowGroup::Coverage, RowKey::Derived(DerivedMetric::DscPreOc)),
    (RowGroup::Coverage, RowKey::Raw(LineItem::RequiredOfficerComp)),
    (RowGroup::Coverage, RowKey::Derived(DerivedMetric::DscPostOc)),
    (RowGroup::CashFlow, RowKey::Raw(LineItem::Distributions)),
    (RowGroup::CashFlow, RowKey::Derived(DerivedMetric::AvailableCf)),
    (RowGroup::CashFlow, RowKey::Derived(DerivedMetric::ExcessCf)),
];

/// Whether raw rows may be edited in this rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPolicy {
    #[default]
    Editable,
    ReadOnly,
}

/// One computed cell
#[derive(Debug, Clone)]
pub struct Cell {
    pub value: f64,
    pub display: String,
    /// Percent change against the previous period
    pub change: Option<f64>,
    /// Formula breakdown for derived rows
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub key: RowKey,
    pub group: RowGroup,
    pub label: &'static str,
    pub editable: bool,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct AnalysisTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl AnalysisTable {
    /// Assemble the table from the current store contents.
    ///
    /// The NOI override row is only shown when an override was supplied.
    pub fn build(store: &PeriodSeries, policy: EditPolicy) -> Self {
        let headers = store.periods().iter().map(|p| p.header()).collect();

        let rows = ROW_LAYOUT
            .iter()
            .filter(|(_, key)| *key != RowKey::Raw(LineItem::Noi) || store.contains(LineItem::Noi))
            .map(|&(group, key)| TableRow {
                key,
                group,
                label: key.label(),
                editable: policy == EditPolicy::Editable && key.is_editable(),
                cells: (0..store.len()).map(|i| build_cell(store, key, i)).collect(),
            })
            .collect();

        Self { headers, rows }
    }

    pub fn row(&self, key: RowKey) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Render for the console with group separator rows
    pub fn render(&self) -> String {
        let mut builder = Builder::default();

        let mut header = vec!["Line Item".to_string()];
        header.extend(self.headers.iter().cloned());
        builder.push_record(header);

        let mut current_group = None;
        for row in &self.rows {
            if current_group != Some(row.group) {
                current_group = Some(row.group);
                let mut separator = vec![row.group.to_string().to_uppercase()];
                separator.extend(self.headers.iter().map(|_| String::new()));
                builder.push_record(separator);
            }

            let label = if row.editable {
                format!("  {}", row.label)
            } else {
                format!("  {} =", row.label)
            };
            let mut record = vec![label];
            record.extend(row.cells.iter().map(|cell| {
                let change = format_change(cell.change);
                if change.is_empty() {
                    cell.display.clone()
                } else {
                    format!("{} {}", cell.display, change)
                }
            }));
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

fn build_cell(store: &PeriodSeries, key: RowKey, index: usize) -> Cell {
    let value = row_value(store, key, index);
    Cell {
        value,
        display: format_value(value, key.unit()),
        change: period_change(store, key, index),
        tooltip: match key {
            RowKey::Derived(metric) => Some(tooltip(metric, &store.at(index))),
            RowKey::Raw(_) => None,
        },
    }
}

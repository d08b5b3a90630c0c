//! CSV report generation

use anyhow::Result;
use csv::Writer;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::consolidated::{ConsolidatedCashFlow, DscrThresholds};
use crate::constants;
use crate::table::AnalysisTable;

/// Write analysis.csv: one row per table row, one value column per period
/// plus a change column for every period after the first
pub fn write_analysis(output_dir: &Path, table: &AnalysisTable) -> Result<PathBuf> {
    let path = output_dir.join(constants::ANALYSIS_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    // Header
    let mut header = vec!["Group".to_string(), "Key".to_string(), "Line_Item".to_string()];
    for (i, period) in table.headers.iter().enumerate() {
        header.push(period.clone());
        if i > 0 {
            header.push(format!("{}_Change_Pct", period));
        }
    }
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![
            row.group.to_string(),
            row.key.key().to_string(),
            row.label.to_string(),
        ];
        for (i, cell) in row.cells.iter().enumerate() {
            record.push(format!("{:.2}", normalize_zero(cell.value)));
            if i > 0 {
                record.push(cell.change.map(|c| format!("{:.2}", c)).unwrap_or_default());
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    info!(path = %path.display(), rows = table.rows.len(), "Wrote analysis report");

    Ok(path)
}

/// Write consolidated.csv: one row per year with aggregate figures
pub fn write_consolidated(
    output_dir: &Path,
    rollup: &ConsolidatedCashFlow,
    thresholds: &DscrThresholds,
) -> Result<PathBuf> {
    let path = output_dir.join(constants::CONSOLIDATED_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Year",
        "Businesses",
        "Gross_Revenue",
        "NOI",
        "Debt_Service",
        "Required_Officer_Comp",
        "DSCR",
        "DSCR_Post_ROC",
        "Coverage",
    ])?;

    let businesses: Vec<&str> = rollup.selected().map(|b| b.name.as_str()).collect();
    let businesses = businesses.join("; ");

    for summary in rollup.summaries(thresholds) {
        wtr.write_record([
            &summary.year,
            &businesses,
            &format!("{:.2}", normalize_zero(summary.gross_revenue)),
            &format!("{:.2}", normalize_zero(summary.noi)),
            &format!("{:.2}", normalize_zero(summary.debt_service)),
            &format!("{:.2}", normalize_zero(summary.required_officer_comp)),
            &format!("{:.2}", summary.dscr),
            &format!("{:.2}", summary.dscr_post_roc),
            &summary.strength.to_string(),
        ])?;
    }

    wtr.flush()?;
    info!(path = %path.display(), "Wrote consolidated report");

    Ok(path)
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

//! Loan analysis command line
//!
//! Loads fixture files, applies edits, prints the analysis tables and writes
//! CSV reports.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use loan_analysis::config::Config;
use loan_analysis::format::format_currency;
use loan_analysis::periods::PeriodSeries;
use loan_analysis::{AnalysisTable, EditPolicy, constants, fixtures, reports};

#[derive(Parser, Debug)]
#[command(name = "loan-analysis")]
#[command(about = "Cash flow, DSCR and ownership analysis for SBA loan applications")]
struct Args {
    /// Config file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated CSV reports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the cash flow analysis table for one business
    Analyze {
        /// Path to JSON file with periods and line items
        file: PathBuf,

        /// Edit a raw cell before computing: KEY:PERIOD=VALUE (PERIOD is an index or date label)
        #[arg(long = "set", value_name = "KEY:PERIOD=VALUE")]
        edits: Vec<String>,

        /// Print formula breakdowns for derived rows
        #[arg(long)]
        explain: bool,

        /// Write analysis.csv to the output directory
        #[arg(long)]
        export: bool,
    },

    /// Show the consolidated cash flow across related businesses
    Consolidate {
        /// Path to JSON file with years, businesses and officer compensation
        file: PathBuf,

        /// Only include these businesses (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,

        /// Set required officer compensation: YEAR=VALUE
        #[arg(long = "roc", value_name = "YEAR=VALUE")]
        roc: Vec<String>,

        /// Write consolidated.csv to the output directory
        #[arg(long)]
        export: bool,
    },

    /// Check ownership eligibility and required documents
    Ownership {
        /// Path to JSON file with current and former owners
        file: PathBuf,

        /// Evaluate as of this date (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Classify a debt service coverage ratio
    Classify {
        /// Coverage ratio, e.g. 1.18
        ratio: f64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::resolve(args.config.as_deref())?;

    match args.command {
        Command::Analyze {
            file,
            edits,
            explain,
            export,
        } => run_analyze(&file, &edits, explain, export.then_some(args.output_dir.as_path())),
        Command::Consolidate {
            file,
            only,
            roc,
            export,
        } => run_consolidate(&config, &file, &only, &roc, export.then_some(args.output_dir.as_path())),
        Command::Ownership { file, as_of } => run_ownership(&config, &file, as_of.as_deref()),
        Command::Classify { ratio } => {
            let strength = config.thresholds.classify(ratio);
            println!("{:.2}x: {}", ratio, strength);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "loan_analysis=debug" } else { "loan_analysis=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Split `KEY:PERIOD=VALUE`
fn parse_edit(arg: &str) -> Result<(&str, &str, &str)> {
    let (target, value) = arg
        .split_once('=')
        .with_context(|| format!("Edit '{}' is missing '=VALUE'", arg))?;
    let (key, period) = target
        .split_once(':')
        .with_context(|| format!("Edit '{}' is missing ':PERIOD'", arg))?;
    Ok((key.trim(), period.trim(), value))
}

/// Period given as a column index or a date label
fn resolve_period(store: &PeriodSeries, period: &str) -> Result<usize> {
    if let Ok(index) = period.parse::<usize>() {
        return Ok(index);
    }
    store
        .periods()
        .iter()
        .position(|p| p.date == period)
        .with_context(|| format!("No period labelled '{}'", period))
}

/// Split `YEAR=VALUE`
fn parse_roc(arg: &str) -> Result<(&str, &str)> {
    let (year, value) = arg
        .split_once('=')
        .with_context(|| format!("Officer compensation '{}' must look like YEAR=VALUE", arg))?;
    Ok((year.trim(), value))
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

fn run_analyze(file: &Path, edits: &[String], explain: bool, export_dir: Option<&Path>) -> Result<()> {
    let mut store = fixtures::load_period_series(file)?;

    for arg in edits {
        let (key, period, value) = parse_edit(arg)?;
        let index = resolve_period(&store, period)?;
        let stored = store
            .apply_edit(key, index, value)
            .with_context(|| format!("Failed to apply edit '{}'", arg))?;
        println!("Set {} [{}] = {}", key, store.periods()[index].date, format_currency(stored));
    }

    let table = AnalysisTable::build(&store, EditPolicy::Editable);
    println!("{}", table.render());
    println!("Rows marked '=' are computed; all others can be edited with --set.");

    if explain {
        println!("\nFormula breakdown:");
        for row in table.rows.iter().filter(|r| !r.editable) {
            println!("\n  {}", row.label);
            for (header, cell) in table.headers.iter().zip(&row.cells) {
                if let Some(tooltip) = &cell.tooltip {
                    println!("    {:<14} {}", header, tooltip);
                }
            }
        }
    }

    if let Some(dir) = export_dir {
        ensure_output_dir(dir)?;
        let path = reports::write_analysis(dir, &table)?;
        println!("\n  Generated: {}", path.display());
    }

    Ok(())
}

fn run_consolidate(
    config: &Config,
    file: &Path,
    only: &[String],
    roc: &[String],
    export_dir: Option<&Path>,
) -> Result<()> {
    let mut rollup = fixtures::load_consolidated(file)?;

    if !only.is_empty() {
        rollup.select_only(only)?;
    }

    for arg in roc {
        let (year, value) = parse_roc(arg)?;
        rollup.set_required_officer_comp(year, value)?;
    }

    let selected: Vec<&str> = rollup.selected().map(|b| b.name.as_str()).collect();
    if selected.is_empty() {
        println!("No businesses selected.");
        return Ok(());
    }

    println!("Businesses: {}\n", selected.join(", "));
    println!("{}", rollup.render(&config.thresholds));
    println!(
        "Coverage bands: strong >= {:.2}x, adequate >= {:.2}x",
        config.thresholds.strong, config.thresholds.adequate
    );

    if let Some(dir) = export_dir {
        ensure_output_dir(dir)?;
        let path = reports::write_consolidated(dir, &rollup, &config.thresholds)?;
        println!("\n  Generated: {}", path.display());
    }

    Ok(())
}

fn run_ownership(config: &Config, file: &Path, as_of: Option<&str>) -> Result<()> {
    let ownership = fixtures::load_ownership(file)?;

    let today = match as_of {
        Some(date) => NaiveDate::parse_from_str(date, constants::DATE_FORMAT)
            .with_context(|| format!("Invalid --as-of date '{}', expected YYYY-MM-DD", date))?,
        None => chrono::Local::now().date_naive(),
    };

    let report = ownership.validate(today, config.lookback_months);

    println!("\n============================================================");
    println!("              OWNERSHIP REVIEW (as of {})", today);
    println!("============================================================\n");

    println!("{:<28} {:>10}  Citizenship", "Owner", "Percent");
    println!("{}", "-".repeat(60));
    for owner in &ownership.current_owners {
        println!(
            "{:<28} {:>9.2}%  {}",
            owner.name, owner.ownership_percentage, owner.citizenship_status
        );
    }
    println!("{}", "-".repeat(60));
    println!("{:<28} {:>9.2}%", "Total", report.total.total);

    if !ownership.former_owners.is_empty() {
        println!("\nFormer owners:");
        for former in &ownership.former_owners {
            let ceased = former
                .date_ownership_ceased
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "  {} (ceased {}, associate: {}, employed: {})",
                former.owner.name, ceased, former.is_still_associate, former.is_still_employed
            );
        }
    }

    println!();
    let alerts = report.alerts();
    if alerts.is_empty() {
        println!("No ownership issues found.");
    } else {
        for alert in &alerts {
            println!("  ! {}", alert);
        }
    }

    println!("\nRequired documents:");
    for (name, documents) in config.documents.for_owners(&ownership.current_owners) {
        if documents.is_empty() {
            println!("  {}: none", name);
        } else {
            println!("  {}: {}", name, documents.join(", "));
        }
    }

    Ok(())
}

//! Loan analysis toolkit
//!
//! Cash-flow analysis tables with derived coverage metrics, a consolidated
//! rollup across related businesses, and ownership eligibility checks for
//! SBA loan underwriting.

pub mod config;
pub mod consolidated;
pub mod constants;
pub mod documents;
pub mod error;
pub mod fixtures;
pub mod format;
pub mod line_items;
pub mod metrics;
pub mod ownership;
pub mod parse;
pub mod periods;
pub mod reports;
pub mod table;

pub use config::{Config, FileConfig};
pub use consolidated::{BusinessCashFlow, ConsolidatedCashFlow, DscrStrength, DscrThresholds, YearSummary};
pub use documents::{DocumentRequirements, OwnershipRange};
pub use error::AnalysisError;
pub use line_items::{DerivedMetric, LineItem, RowKey};
pub use metrics::LineItemSource;
pub use ownership::{CitizenshipStatus, FormerOwner, Ownership, OwnershipEntry, OwnershipReport};
pub use parse::{parse_number_or_default, parse_number_strict};
pub use periods::{Period, PeriodSeries, PeriodType};
pub use table::{AnalysisTable, EditPolicy};

//! Centralized constants for the loan analysis toolkit
//!
//! Lender-specific overrides are loaded from config.toml; these are the
//! defaults used when no configuration is present.

// =============================================================================
// Debt Service Coverage
// =============================================================================

/// Coverage at or above this ratio is considered strong
pub const DSCR_STRONG_THRESHOLD: f64 = 1.25;

/// Coverage at or above this ratio (and below strong) is adequate
pub const DSCR_ADEQUATE_THRESHOLD: f64 = 1.00;

/// Decimal places kept on coverage ratios
pub const RATIO_DECIMALS: i32 = 2;

// =============================================================================
// Ownership
// =============================================================================

/// Current owners must add up to this percentage
pub const FULL_OWNERSHIP_PERCENT: f64 = 100.0;

/// Float slack allowed when comparing the ownership total
pub const OWNERSHIP_TOLERANCE: f64 = 0.001;

/// Former owners who left within this many months still count for eligibility
pub const FORMER_OWNER_LOOKBACK_MONTHS: u32 = 6;

/// Citizenship status that makes an owner ineligible
pub const INELIGIBLE_CITIZENSHIP: &str = "Other/Ineligible Person";

// =============================================================================
// Formats
// =============================================================================

/// Date format for fixtures and CLI arguments
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder shown instead of a non-finite or missing value
pub const EMPTY_CELL: &str = "-";

// =============================================================================
// File Names
// =============================================================================

/// Default configuration file
pub const CONFIG_FILENAME: &str = "config.toml";

/// Period analysis export
pub const ANALYSIS_FILENAME: &str = "analysis.csv";

/// Consolidated rollup export
pub const CONSOLIDATED_FILENAME: &str = "consolidated.csv";

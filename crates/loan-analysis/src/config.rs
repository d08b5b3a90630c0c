//! Configuration for the loan analysis toolkit

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::consolidated::DscrThresholds;
use crate::constants;
use crate::documents::{DocumentRequirements, OwnershipRange};

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Document templates by ownership range (standard set when omitted)
    #[serde(default)]
    pub ownership_ranges: Option<Vec<OwnershipRange>>,
}

/// Underwriting thresholds
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Lower bound of the strong coverage band
    #[serde(default = "default_strong")]
    pub dscr_strong: f64,
    /// Lower bound of the adequate coverage band
    #[serde(default = "default_adequate")]
    pub dscr_adequate: f64,
    /// How long a departed ineligible owner still counts against eligibility
    #[serde(default = "default_lookback")]
    pub former_owner_lookback_months: u32,
}

fn default_strong() -> f64 {
    constants::DSCR_STRONG_THRESHOLD
}

fn default_adequate() -> f64 {
    constants::DSCR_ADEQUATE_THRESHOLD
}

fn default_lookback() -> u32 {
    constants::FORMER_OWNER_LOOKBACK_MONTHS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dscr_strong: default_strong(),
            dscr_adequate: default_adequate(),
            former_owner_lookback_months: default_lookback(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (strings vs numbers)\n\
             - Ownership ranges missing min, max or templates\n\n\
             See config.toml.example for the expected format."
        })
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Coverage bands
    pub thresholds: DscrThresholds,
    /// Former-owner lookback window in months
    pub lookback_months: u32,
    /// Required documents by ownership range
    pub documents: DocumentRequirements,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: DscrThresholds::default(),
            lookback_months: constants::FORMER_OWNER_LOOKBACK_MONTHS,
            documents: DocumentRequirements::standard(),
        }
    }
}

impl Config {
    /// Create config from file config, validating thresholds and ranges
    pub fn from_file(file_config: &FileConfig) -> Result<Self> {
        let analysis = &file_config.analysis;

        if !(analysis.dscr_adequate.is_finite() && analysis.dscr_strong.is_finite())
            || analysis.dscr_adequate > analysis.dscr_strong
        {
            anyhow::bail!(
                "Invalid coverage thresholds: dscr_adequate ({}) must not exceed dscr_strong ({})",
                analysis.dscr_adequate,
                analysis.dscr_strong
            );
        }

        let documents = match &file_config.ownership_ranges {
            Some(ranges) => {
                DocumentRequirements::new(ranges.clone()).with_context(|| "Invalid ownership_ranges")?
            }
            None => DocumentRequirements::standard(),
        };

        Ok(Self {
            thresholds: DscrThresholds {
                strong: analysis.dscr_strong,
                adequate: analysis.dscr_adequate,
            },
            lookback_months: analysis.former_owner_lookback_months,
            documents,
        })
    }

    /// Load an explicitly requested file, or the default file when present.
    ///
    /// Without either, built-in defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "Config file '{}' not found.\n\n\
                        Copy config.toml.example to config.toml and adjust the thresholds,\n\
                        or omit --config to use the built-in defaults.",
                        path.display()
                    );
                }
                Self::from_file(&FileConfig::load(path)?)
            }
            None => {
                let default_path = Path::new(constants::CONFIG_FILENAME);
                if default_path.exists() {
                    Self::from_file(&FileConfig::load(default_path)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

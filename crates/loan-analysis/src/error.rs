//! Error type for the analysis library
//!
//! Derivations never fail; these errors only come from the edges where raw
//! input enters the stores (edits, fixtures, configuration).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("unknown line item: {0}")]
    UnknownLineItem(String),

    #[error("row '{0}' is derived and cannot be edited")]
    ReadOnlyRow(String),

    #[error("period index {index} out of range ({len} periods)")]
    PeriodOutOfRange { index: usize, len: usize },

    #[error("series '{key}' has {actual} values, expected {expected}")]
    SeriesLengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown business: {0}")]
    UnknownBusiness(String),

    #[error("unknown year: {0}")]
    UnknownYear(String),

    #[error("value is empty")]
    EmptyNumber,

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("invalid ownership range {min}-{max}: bounds must satisfy 0 <= min <= max <= 100")]
    InvalidOwnershipRange { min: f64, max: f64 },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

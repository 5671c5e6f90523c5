//! Error types for risk factor parsing

use thiserror::Error;

/// Risk factor parse error
///
/// Scoring itself never fails; these only come from converting wire tokens
/// (form fields, dataset cells) into typed risk factors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Flag token other than "0" or "1"
    #[error("Invalid flag value: {0:?} (expected \"0\" or \"1\")")]
    InvalidFlag(String),

    /// Smoking status outside the known categories
    #[error("Unknown smoking status: {0:?}")]
    UnknownSmokingStatus(String),

    /// Risk label outside Low/Medium/High Risk
    #[error("Unknown risk level: {0:?}")]
    UnknownRiskLevel(String),

    /// Numeric measurement that does not parse
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber {
        /// Field being parsed
        field: &'static str,
        /// Raw token
        value: String,
    },
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

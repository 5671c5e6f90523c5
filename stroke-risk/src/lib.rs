//! Stroke risk scoring for StrokeGuard
//!
//! Rule-based additive scoring of six patient risk factors into a
//! Low / Medium / High risk label.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod scoring;
pub mod types;

pub use error::{Error, Result};
pub use scoring::{score_risk, RiskScorer};
pub use types::*;

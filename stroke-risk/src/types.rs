//! Core types for stroke risk scoring

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// BMI substituted when a dataset row carries the missing-value sentinel
pub const BMI_DEFAULT: f64 = 28.0;

/// Placeholder token for a missing numeric measurement
pub const MISSING_VALUE_SENTINEL: &str = "N/A";

/// Risk score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Maximum score
    pub const MAX: u8 = 100;

    /// Create new risk score, capped at 100
    pub fn new(score: u8) -> Self {
        Self(score.min(Self::MAX))
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }

    /// Check if high risk (>= 60)
    pub fn is_high_risk(&self) -> bool {
        self.0 >= 60
    }

    /// Check if medium risk (30-59)
    pub fn is_medium_risk(&self) -> bool {
        (30..60).contains(&self.0)
    }

    /// Check if low risk (< 30)
    pub fn is_low_risk(&self) -> bool {
        self.0 < 30
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk
    #[serde(rename = "Low Risk")]
    Low,
    /// Medium risk
    #[serde(rename = "Medium Risk")]
    Medium,
    /// High risk
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// All levels, lowest first
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Label as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

impl From<RiskScore> for RiskLevel {
    fn from(score: RiskScore) -> Self {
        if score.is_high_risk() {
            RiskLevel::High
        } else if score.is_medium_risk() {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| Error::UnknownRiskLevel(s.to_string()))
    }
}

/// Smoking status category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmokingStatus {
    /// Current smoker
    #[serde(rename = "smokes")]
    Smokes,
    /// Former smoker
    #[serde(rename = "formerly smoked")]
    FormerlySmoked,
    /// Never smoked
    #[serde(rename = "never smoked")]
    NeverSmoked,
    /// Not recorded
    #[serde(rename = "Unknown")]
    Unknown,
}

impl SmokingStatus {
    /// All categories
    pub const ALL: [SmokingStatus; 4] = [
        SmokingStatus::Smokes,
        SmokingStatus::FormerlySmoked,
        SmokingStatus::NeverSmoked,
        SmokingStatus::Unknown,
    ];

    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingStatus::Smokes => "smokes",
            SmokingStatus::FormerlySmoked => "formerly smoked",
            SmokingStatus::NeverSmoked => "never smoked",
            SmokingStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SmokingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmokingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SmokingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownSmokingStatus(s.to_string()))
    }
}

/// The six scored risk factors of a patient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Age in years
    pub age: f64,

    /// Hypertension diagnosed
    #[serde(with = "flag")]
    pub hypertension: bool,

    /// Heart disease diagnosed
    #[serde(with = "flag")]
    pub heart_disease: bool,

    /// Average glucose level (mg/dL)
    pub avg_glucose_level: f64,

    /// Body mass index
    pub bmi: f64,

    /// Smoking status
    pub smoking_status: SmokingStatus,
}

/// Points contributed by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorContribution {
    /// Rule name
    pub name: String,

    /// Points added
    pub points: u8,
}

/// Risk assessment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Capped score
    pub risk_score: RiskScore,

    /// Risk level
    pub risk_level: RiskLevel,

    /// Rules that fired, in evaluation order
    pub contributions: Vec<FactorContribution>,
}

/// Parse a "0"/"1" indicator
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(Error::InvalidFlag(other.to_string())),
    }
}

/// Parse a BMI cell, substituting [`BMI_DEFAULT`] for the missing-value sentinel
pub fn parse_bmi(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw == MISSING_VALUE_SENTINEL {
        return Ok(BMI_DEFAULT);
    }
    parse_measurement("bmi", raw)
}

/// Parse a finite numeric measurement
pub fn parse_measurement(field: &'static str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| Error::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Serde adapter for "0"/"1" indicators
///
/// Serializes as "0"/"1". Deserializes from "0"/"1", 0/1 or a JSON boolean.
pub mod flag {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(u64),
        Str(String),
    }

    /// Serialize a flag as "0"/"1"
    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    /// Deserialize a flag from any accepted representation
    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawFlag::deserialize(deserializer)? {
            RawFlag::Bool(value) => Ok(value),
            RawFlag::Int(0) => Ok(false),
            RawFlag::Int(1) => Ok(true),
            RawFlag::Int(other) => Err(de::Error::custom(format!(
                "invalid flag value {} (expected 0 or 1)",
                other
            ))),
            RawFlag::Str(raw) => super::parse_flag(&raw).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_capped() {
        assert_eq!(RiskScore::new(125).score(), 100);
        assert_eq!(RiskScore::new(42).score(), 42);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(RiskLevel::from(RiskScore::new(29)), RiskLevel::Low);
        assert_eq!(RiskLevel::from(RiskScore::new(30)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from(RiskScore::new(59)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from(RiskScore::new(60)), RiskLevel::High);
        assert_eq!(RiskLevel::from(RiskScore::new(100)), RiskLevel::High);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(RiskLevel::High.to_string(), "High Risk");
        assert_eq!("Medium Risk".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!("medium".parse::<RiskLevel>().is_err());
        assert_eq!(
            serde_json::to_string(&RiskLevel::Low).unwrap(),
            "\"Low Risk\""
        );
    }

    #[test]
    fn test_smoking_status_tokens() {
        assert_eq!(
            "formerly smoked".parse::<SmokingStatus>().unwrap(),
            SmokingStatus::FormerlySmoked
        );
        assert_eq!("Unknown".parse::<SmokingStatus>().unwrap(), SmokingStatus::Unknown);
        assert_eq!(
            "Smokes".parse::<SmokingStatus>(),
            Err(Error::UnknownSmokingStatus("Smokes".to_string()))
        );
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(matches!(parse_flag("yes"), Err(Error::InvalidFlag(_))));
    }

    #[test]
    fn test_parse_bmi_sentinel() {
        assert_eq!(parse_bmi("N/A").unwrap(), BMI_DEFAULT);
        assert_eq!(parse_bmi("36.6").unwrap(), 36.6);
        assert!(matches!(
            parse_bmi("heavy"),
            Err(Error::InvalidNumber { field: "bmi", .. })
        ));
    }

    #[test]
    fn test_parse_measurement_rejects_non_finite() {
        assert!(parse_measurement("age", "NaN").is_err());
        assert!(parse_measurement("age", "inf").is_err());
        assert_eq!(parse_measurement("age", " 0.08 ").unwrap(), 0.08);
    }

    #[test]
    fn test_flag_serde() {
        let factors: RiskFactors = serde_json::from_str(
            r#"{"age": 61, "hypertension": "1", "heart_disease": false,
                "avg_glucose_level": 99.5, "bmi": 27.0, "smoking_status": "never smoked"}"#,
        )
        .unwrap();
        assert!(factors.hypertension);
        assert!(!factors.heart_disease);

        let json = serde_json::to_value(factors).unwrap();
        assert_eq!(json["hypertension"], "1");
        assert_eq!(json["heart_disease"], "0");

        let bad = serde_json::from_str::<RiskFactors>(
            r#"{"age": 61, "hypertension": 2, "heart_disease": 0,
                "avg_glucose_level": 99.5, "bmi": 27.0, "smoking_status": "never smoked"}"#,
        );
        assert!(bad.is_err());
    }
}

use crate::errors::{Result, StrokeGuardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use stroke_risk::{RiskAssessment, RiskFactors, RiskLevel, SmokingStatus};
use validator::{Validate, ValidationError};

/// Categorical form field stored as its display token
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StrokeGuardError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    other => Err(StrokeGuardError::Validation(format!(
                        "invalid {}: {:?}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

text_enum!(EverMarried {
    Yes => "Yes",
    No => "No",
});

text_enum!(
    /// The public dataset spells children in lowercase
    WorkType {
        Private => "Private",
        SelfEmployed => "Self-employed",
        GovtJob => "Govt_job",
        Children => "Children" | "children",
        NeverWorked => "Never_worked",
    }
);

text_enum!(ResidenceType {
    Urban => "Urban",
    Rural => "Rural",
});

// ===== Users =====
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 4, max = 25))]
    pub username: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

// ===== Patients =====

/// Patient fields accepted from clients and dataset rows.
///
/// The risk label is never part of the input; it is always derived.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PatientRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    pub gender: Gender,
    #[validate(range(min = 0.0, max = 150.0))]
    pub age: f64,
    #[serde(with = "stroke_risk::flag")]
    pub hypertension: bool,
    #[serde(with = "stroke_risk::flag")]
    pub heart_disease: bool,
    pub ever_married: EverMarried,
    pub work_type: WorkType,
    pub residence_type: ResidenceType,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub avg_glucose_level: f64,
    #[validate(custom = "validate_positive")]
    pub bmi: f64,
    pub smoking_status: SmokingStatus,
}

impl PatientRequest {
    pub fn risk_factors(&self) -> RiskFactors {
        RiskFactors {
            age: self.age,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            avg_glucose_level: self.avg_glucose_level,
            bmi: self.bmi,
            smoking_status: self.smoking_status,
        }
    }
}

fn validate_positive(value: f64) -> std::result::Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("positive"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub gender: Gender,
    pub age: f64,
    #[serde(with = "stroke_risk::flag")]
    pub hypertension: bool,
    #[serde(with = "stroke_risk::flag")]
    pub heart_disease: bool,
    pub ever_married: EverMarried,
    pub work_type: WorkType,
    pub residence_type: ResidenceType,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    pub smoking_status: SmokingStatus,
    pub stroke_risk: RiskLevel,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn risk_factors(&self) -> RiskFactors {
        RiskFactors {
            age: self.age,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            avg_glucose_level: self.avg_glucose_level,
            bmi: self.bmi,
            smoking_status: self.smoking_status,
        }
    }
}

/// Patient as stored; categorical columns are TEXT
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub age: f64,
    pub hypertension: bool,
    pub heart_disease: bool,
    pub ever_married: String,
    pub work_type: String,
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    pub smoking_status: String,
    pub stroke_risk: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = StrokeGuardError;

    fn try_from(row: PatientRow) -> Result<Self> {
        let id = row.id;
        let corrupt = |e: StrokeGuardError| {
            StrokeGuardError::Internal(format!("Corrupt patient row {}: {}", id, e))
        };

        Ok(Patient {
            id,
            gender: row.gender.parse().map_err(corrupt)?,
            age: row.age,
            hypertension: row.hypertension,
            heart_disease: row.heart_disease,
            ever_married: row.ever_married.parse().map_err(corrupt)?,
            work_type: row.work_type.parse().map_err(corrupt)?,
            residence_type: row.residence_type.parse().map_err(corrupt)?,
            avg_glucose_level: row.avg_glucose_level,
            bmi: row.bmi,
            smoking_status: row
                .smoking_status
                .parse()
                .map_err(|e: stroke_risk::Error| corrupt(e.into()))?,
            stroke_risk: row
                .stroke_risk
                .parse()
                .map_err(|e: stroke_risk::Error| corrupt(e.into()))?,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            name: row.name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PatientResponse {
    pub patient: Patient,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// Search term, ignoring blank input
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub high_risk: i64,
    pub medium_risk: i64,
    pub low_risk: i64,
}

impl RiskCounts {
    pub fn total(&self) -> i64 {
        self.high_risk + self.medium_risk + self.low_risk
    }

    pub fn record(&mut self, level: RiskLevel) {
        self.add(level, 1);
    }

    pub fn add(&mut self, level: RiskLevel, count: i64) {
        match level {
            RiskLevel::High => self.high_risk += count,
            RiskLevel::Medium => self.medium_risk += count,
            RiskLevel::Low => self.low_risk += count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub patients: Vec<Patient>,
    pub stats: RiskCounts,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub stats: RiskCounts,
}

// ===== Health Check =====
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_json() -> serde_json::Value {
        serde_json::json!({
            "name": "John Doe",
            "gender": "Male",
            "age": 65,
            "hypertension": "1",
            "heart_disease": "0",
            "ever_married": "Yes",
            "work_type": "Private",
            "residence_type": "Urban",
            "avg_glucose_level": 180.5,
            "bmi": 29.0,
            "smoking_status": "formerly smoked"
        })
    }

    #[test]
    fn test_patient_request_parses_wire_tokens() {
        let request: PatientRequest = serde_json::from_value(request_json()).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.hypertension);
        assert!(!request.heart_disease);
        assert_eq!(request.smoking_status, SmokingStatus::FormerlySmoked);
        assert_eq!(request.work_type, WorkType::Private);
    }

    #[test]
    fn test_patient_request_rejects_risk_label() {
        let mut json = request_json();
        json["stroke_risk"] = "Low Risk".into();
        assert!(serde_json::from_value::<PatientRequest>(json).is_err());
    }

    #[test]
    fn test_patient_request_validation() {
        let mut json = request_json();
        json["name"] = "J".into();
        json["bmi"] = 0.0.into();
        let request: PatientRequest = serde_json::from_value(json).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("bmi"));
    }

    #[test]
    fn test_work_type_accepts_dataset_spelling() {
        assert_eq!("children".parse::<WorkType>().unwrap(), WorkType::Children);
        assert_eq!(WorkType::Children.as_str(), "Children");
        assert_eq!("Self-employed".parse::<WorkType>().unwrap(), WorkType::SelfEmployed);
        assert!("Retired".parse::<WorkType>().is_err());
    }

    #[test]
    fn test_register_passwords_must_match() {
        let request = RegisterRequest {
            username: "doctor".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        assert!(request.validate().is_err());

        let request = RegisterRequest {
            confirm_password: "secret1".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_risk_counts() {
        let mut counts = RiskCounts::default();
        counts.record(RiskLevel::High);
        counts.record(RiskLevel::Low);
        counts.add(RiskLevel::Medium, 3);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.medium_risk, 3);
    }
}

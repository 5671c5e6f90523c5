use crate::errors::{Result, StrokeGuardError};
use crate::models::Patient;

pub const EXPORT_FILENAME: &str = "patient_data.csv";

const HEADER: [&str; 13] = [
    "ID",
    "Name",
    "Gender",
    "Age",
    "Hypertension",
    "Heart Disease",
    "Glucose Level",
    "BMI",
    "Smoking Status",
    "Work Type",
    "Residence Type",
    "Married",
    "Stroke Risk",
];

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Render patients as a CSV spreadsheet, one row per patient
pub fn patients_to_csv(patients: &[Patient]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for p in patients {
        writer.write_record([
            p.id.to_string(),
            p.name.clone(),
            p.gender.to_string(),
            p.age.to_string(),
            flag(p.hypertension).to_string(),
            flag(p.heart_disease).to_string(),
            p.avg_glucose_level.to_string(),
            p.bmi.to_string(),
            p.smoking_status.to_string(),
            p.work_type.to_string(),
            p.residence_type.to_string(),
            p.ever_married.to_string(),
            p.stroke_risk.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| StrokeGuardError::Internal(format!("CSV flush failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EverMarried, Gender, ResidenceType, WorkType};
    use chrono::Utc;
    use stroke_risk::{RiskLevel, SmokingStatus};

    fn patient(id: i64, name: &str) -> Patient {
        Patient {
            id,
            name: name.to_string(),
            gender: Gender::Female,
            age: 67.0,
            hypertension: true,
            heart_disease: false,
            ever_married: EverMarried::Yes,
            work_type: WorkType::SelfEmployed,
            residence_type: ResidenceType::Rural,
            avg_glucose_level: 228.69,
            bmi: 36.6,
            smoking_status: SmokingStatus::FormerlySmoked,
            stroke_risk: RiskLevel::High,
            user_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_layout() {
        let bytes = patients_to_csv(&[patient(1, "Jane Roe"), patient(2, "Doe, John")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ID,Name,Gender,Age,Hypertension,Heart Disease,Glucose Level,BMI,Smoking Status,Work Type,Residence Type,Married,Stroke Risk"
        );
        assert_eq!(
            lines[1],
            "1,Jane Roe,Female,67,1,0,228.69,36.6,formerly smoked,Self-employed,Rural,Yes,High Risk"
        );
        // names containing the delimiter are quoted
        assert!(lines[2].starts_with("2,\"Doe, John\","));
    }

    #[test]
    fn test_export_empty() {
        let text = String::from_utf8(patients_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}

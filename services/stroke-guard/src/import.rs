//! Reader for the public stroke prediction dataset.
//!
//! Expected columns: `id, gender, age, hypertension, heart_disease,
//! ever_married, work_type, Residence_type, avg_glucose_level, bmi,
//! smoking_status`. Extra columns (such as the `stroke` outcome) are ignored.

use crate::errors::{Result, StrokeGuardError};
use crate::models::PatientRequest;
use serde::Deserialize;
use std::io::Read;
use stroke_risk::{parse_bmi, parse_flag, parse_measurement};
use validator::Validate;

#[derive(Debug, Deserialize)]
struct DatasetRow {
    id: String,
    gender: String,
    age: String,
    hypertension: String,
    heart_disease: String,
    ever_married: String,
    work_type: String,
    #[serde(rename = "Residence_type")]
    residence_type: String,
    avg_glucose_level: String,
    bmi: String,
    smoking_status: String,
}

impl DatasetRow {
    fn into_patient(self) -> Result<PatientRequest> {
        Ok(PatientRequest {
            name: format!("Patient {}", self.id),
            gender: self.gender.parse()?,
            age: parse_measurement("age", &self.age)?,
            hypertension: parse_flag(&self.hypertension)?,
            heart_disease: parse_flag(&self.heart_disease)?,
            ever_married: self.ever_married.parse()?,
            work_type: self.work_type.parse()?,
            residence_type: self.residence_type.parse()?,
            avg_glucose_level: parse_measurement("avg_glucose_level", &self.avg_glucose_level)?,
            bmi: parse_bmi(&self.bmi)?,
            smoking_status: self.smoking_status.parse()?,
        })
    }
}

/// Parse every dataset row into patient fields.
///
/// A missing BMI ("N/A") becomes the default BMI. Rows are validated like
/// form input. The first malformed or invalid row fails the whole read with
/// its line number.
pub fn read_dataset<R: Read>(source: R) -> Result<Vec<PatientRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();

    let mut patients = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let patient = record
            .deserialize::<DatasetRow>(Some(&headers))
            .map_err(StrokeGuardError::from)
            .and_then(DatasetRow::into_patient)
            .and_then(|patient| {
                patient.validate()?;
                Ok(patient)
            })
            .map_err(|e| StrokeGuardError::Csv(format!("line {}: {}", line, e)))?;

        patients.push(patient);
    }

    Ok(patients)
}

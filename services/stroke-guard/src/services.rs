use crate::database::Database;
use crate::errors::{Result, StrokeGuardError};
use crate::export;
use crate::import;
use crate::metrics;
use crate::models::{
    DashboardResponse, ImportSummary, Patient, PatientRequest, PatientResponse, RiskCounts,
};
use std::io::Read;
use std::sync::Arc;
use stroke_risk::{RiskAssessment, RiskLevel, RiskScorer};
use tracing::info;
use validator::Validate;

pub struct PatientService {
    db: Arc<Database>,
    scorer: RiskScorer,
    progress_interval: usize,
}

impl PatientService {
    pub fn new(db: Arc<Database>, progress_interval: usize) -> Self {
        PatientService {
            db,
            scorer: RiskScorer::new(),
            progress_interval: progress_interval.max(1),
        }
    }

    fn assess(&self, request: &PatientRequest, source: &str) -> RiskAssessment {
        let assessment = self.scorer.assess(&request.risk_factors());
        metrics::RISK_ASSESSMENTS
            .with_label_values(&[assessment.risk_level.as_str(), source])
            .inc();
        assessment
    }

    /// Register a patient and store the computed risk label
    pub async fn create_patient(
        &self,
        request: PatientRequest,
        user_id: i64,
    ) -> Result<PatientResponse> {
        request.validate()?;

        let assessment = self.assess(&request, "create");
        let patient = self
            .db
            .insert_patient(&request, assessment.risk_level, user_id)
            .await?;

        metrics::PATIENT_RECORDS_CHANGED
            .with_label_values(&["create"])
            .inc();
        info!(
            "Patient {} added by user {}: {} (score {})",
            patient.id, user_id, assessment.risk_level, assessment.risk_score
        );

        Ok(PatientResponse { patient, assessment })
    }

    /// Replace a patient's fields and recompute the risk label
    pub async fn update_patient(
        &self,
        patient_id: i64,
        request: PatientRequest,
    ) -> Result<PatientResponse> {
        request.validate()?;

        let assessment = self.assess(&request, "update");
        let patient = self
            .db
            .update_patient(patient_id, &request, assessment.risk_level)
            .await?
            .ok_or(StrokeGuardError::PatientNotFound(patient_id))?;

        metrics::PATIENT_RECORDS_CHANGED
            .with_label_values(&["update"])
            .inc();
        info!(
            "Patient {} updated: {} (score {})",
            patient.id, assessment.risk_level, assessment.risk_score
        );

        Ok(PatientResponse { patient, assessment })
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient> {
        self.db
            .get_patient(patient_id)
            .await?
            .ok_or(StrokeGuardError::PatientNotFound(patient_id))
    }

    pub async fn delete_patient(&self, patient_id: i64) -> Result<()> {
        if !self.db.delete_patient(patient_id).await? {
            return Err(StrokeGuardError::PatientNotFound(patient_id));
        }

        metrics::PATIENT_RECORDS_CHANGED
            .with_label_values(&["delete"])
            .inc();
        info!("Patient {} deleted", patient_id);
        Ok(())
    }

    pub async fn list_patients(&self, search: Option<&str>) -> Result<Vec<Patient>> {
        self.db.list_patients(search).await
    }

    /// Patient list plus risk label counts over every patient
    pub async fn dashboard(&self, search: Option<&str>) -> Result<DashboardResponse> {
        let patients = self.db.list_patients(search).await?;
        let stats = self.db.risk_level_counts().await?;
        Ok(DashboardResponse { patients, stats })
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let patients = self.db.list_patients(None).await?;
        info!("Exporting {} patients", patients.len());
        export::patients_to_csv(&patients)
    }

    /// Score and store every row of a dataset CSV in one transaction.
    ///
    /// Rows are validated while reading, so nothing is stored unless every row is valid.
    pub async fn import_csv<R: Read>(&self, source: R, user_id: i64) -> Result<ImportSummary> {
        let rows = import::read_dataset(source)?;
        info!("Importing {} dataset rows for user {}", rows.len(), user_id);

        let mut stats = RiskCounts::default();
        let mut scored: Vec<(PatientRequest, RiskLevel)> = Vec::with_capacity(rows.len());
        for (index, request) in rows.into_iter().enumerate() {
            let level = self.assess(&request, "import").risk_level;
            stats.record(level);
            scored.push((request, level));

            if (index + 1) % self.progress_interval == 0 {
                info!("Processed {} records...", index + 1);
            }
        }

        let imported = self.db.insert_patients(&scored, user_id).await?;

        metrics::PATIENTS_IMPORTED.inc_by(imported as u64);
        info!("Imported {} patients", imported);

        Ok(ImportSummary { imported, stats })
    }
}

use crate::errors::Result;
use crate::models::{Patient, PatientRequest, PatientRow, RiskCounts, User};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use stroke_risk::RiskLevel;
use tracing::{info, warn};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        gender TEXT NOT NULL,
        age REAL NOT NULL,
        hypertension INTEGER NOT NULL,
        heart_disease INTEGER NOT NULL,
        ever_married TEXT NOT NULL,
        work_type TEXT NOT NULL,
        residence_type TEXT NOT NULL,
        avg_glucose_level REAL NOT NULL,
        bmi REAL NOT NULL,
        smoking_status TEXT NOT NULL,
        stroke_risk TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_patients_stroke_risk ON patients (stroke_risk)",
];

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and create the schema if needed.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect_with(options)
                .await?
        };

        let db = Database { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ===== Users =====

    /// Insert a user; `None` when the username is already taken
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (username) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // ===== Patients =====

    pub async fn insert_patient(
        &self,
        patient: &PatientRequest,
        stroke_risk: RiskLevel,
        user_id: i64,
    ) -> Result<Patient> {
        insert_patient_with(&self.pool, patient, stroke_risk, user_id).await
    }

    /// Insert many patients in one transaction; nothing is stored on error
    pub async fn insert_patients(
        &self,
        patients: &[(PatientRequest, RiskLevel)],
        user_id: i64,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for (patient, stroke_risk) in patients {
            insert_patient_with(&mut *tx, patient, *stroke_risk, user_id).await?;
        }

        tx.commit().await?;
        Ok(patients.len())
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Option<Patient>> {
        let row = sqlx::query_as::<_, PatientRow>("SELECT * FROM patients WHERE id = ?1")
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Patient::try_from).transpose()
    }

    /// Overwrite every input field together with the recomputed label
    pub async fn update_patient(
        &self,
        patient_id: i64,
        patient: &PatientRequest,
        stroke_risk: RiskLevel,
    ) -> Result<Option<Patient>> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            UPDATE patients
            SET name = ?1,
                gender = ?2,
                age = ?3,
                hypertension = ?4,
                heart_disease = ?5,
                ever_married = ?6,
                work_type = ?7,
                residence_type = ?8,
                avg_glucose_level = ?9,
                bmi = ?10,
                smoking_status = ?11,
                stroke_risk = ?12,
                updated_at = ?13
            WHERE id = ?14
            RETURNING *
            "#,
        )
        .bind(&patient.name)
        .bind(patient.gender.as_str())
        .bind(patient.age)
        .bind(patient.hypertension)
        .bind(patient.heart_disease)
        .bind(patient.ever_married.as_str())
        .bind(patient.work_type.as_str())
        .bind(patient.residence_type.as_str())
        .bind(patient.avg_glucose_level)
        .bind(patient.bmi)
        .bind(patient.smoking_status.as_str())
        .bind(stroke_risk.as_str())
        .bind(Utc::now())
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Patient::try_from).transpose()
    }

    /// Returns whether a row was deleted
    pub async fn delete_patient(&self, patient_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
            .bind(patient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All patients ordered by id, optionally filtered by a case-insensitive name substring
    pub async fn list_patients(&self, search: Option<&str>) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT * FROM patients
            WHERE ?1 IS NULL OR instr(lower(name), lower(?1)) > 0
            ORDER BY id
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    pub async fn risk_level_counts(&self) -> Result<RiskCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT stroke_risk, COUNT(*) FROM patients GROUP BY stroke_risk",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = RiskCounts::default();
        for (label, count) in rows {
            match label.parse::<RiskLevel>() {
                Ok(level) => counts.add(level, count),
                Err(e) => warn!("Skipping {} patients with unknown label: {}", count, e),
            }
        }

        Ok(counts)
    }
}

async fn insert_patient_with<'e, E>(
    executor: E,
    patient: &PatientRequest,
    stroke_risk: RiskLevel,
    user_id: i64,
) -> Result<Patient>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();

    let row = sqlx::query_as::<_, PatientRow>(
        r#"
        INSERT INTO patients (
            name, gender, age, hypertension, heart_disease, ever_married, work_type,
            residence_type, avg_glucose_level, bmi, smoking_status, stroke_risk,
            user_id, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
        RETURNING *
        "#,
    )
    .bind(&patient.name)
    .bind(patient.gender.as_str())
    .bind(patient.age)
    .bind(patient.hypertension)
    .bind(patient.heart_disease)
    .bind(patient.ever_married.as_str())
    .bind(patient.work_type.as_str())
    .bind(patient.residence_type.as_str())
    .bind(patient.avg_glucose_level)
    .bind(patient.bmi)
    .bind(patient.smoking_status.as_str())
    .bind(stroke_risk.as_str())
    .bind(user_id)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Patient::try_from(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EverMarried, Gender, ResidenceType, WorkType};
    use stroke_risk::SmokingStatus;

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:", 1).await.unwrap()
    }

    fn request(name: &str) -> PatientRequest {
        PatientRequest {
            name: name.to_string(),
            gender: Gender::Female,
            age: 44.0,
            hypertension: false,
            heart_disease: false,
            ever_married: EverMarried::Yes,
            work_type: WorkType::Private,
            residence_type: ResidenceType::Urban,
            avg_glucose_level: 90.0,
            bmi: 24.0,
            smoking_status: SmokingStatus::NeverSmoked,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_returns_none() {
        let db = memory_db().await;
        assert!(db.create_user("doctor", "hash").await.unwrap().is_some());
        assert!(db.create_user("doctor", "other").await.unwrap().is_none());
        assert_eq!(
            db.find_user_by_username("doctor")
                .await
                .unwrap()
                .unwrap()
                .password_hash,
            "hash"
        );
    }

    #[tokio::test]
    async fn test_failed_batch_stores_nothing() {
        let db = memory_db().await;
        let batch = vec![
            (request("Anna Bell"), RiskLevel::Low),
            (request("Carl Dunn"), RiskLevel::Low),
        ];

        // no such owner, so the foreign key rejects the batch
        assert!(db.insert_patients(&batch, 999).await.is_err());
        assert!(db.list_patients(None).await.unwrap().is_empty());

        let user = db.create_user("doctor", "hash").await.unwrap().unwrap();
        assert_eq!(db.insert_patients(&batch, user.id).await.unwrap(), 2);
        assert_eq!(db.risk_level_counts().await.unwrap().low_risk, 2);
    }

    #[tokio::test]
    async fn test_search_ignores_case() {
        let db = memory_db().await;
        let user = db.create_user("doctor", "hash").await.unwrap().unwrap();
        db.insert_patient(&request("Anna Bell"), RiskLevel::Low, user.id)
            .await
            .unwrap();
        db.insert_patient(&request("Carl Dunn"), RiskLevel::Low, user.id)
            .await
            .unwrap();

        let found = db.list_patients(Some("bEL")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Anna Bell");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_patient() {
        let db = memory_db().await;
        assert!(db
            .update_patient(7, &request("Nobody"), RiskLevel::Low)
            .await
            .unwrap()
            .is_none());
        assert!(!db.delete_patient(7).await.unwrap());
    }
}

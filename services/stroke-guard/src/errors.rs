use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StrokeGuardError>;

#[derive(Error, Debug)]
pub enum StrokeGuardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid risk factor: {0}")]
    RiskFactor(#[from] stroke_risk::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(i64),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Login failed")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for StrokeGuardError {
    fn from(err: validator::ValidationErrors) -> Self {
        StrokeGuardError::Validation(err.to_string())
    }
}

impl From<csv::Error> for StrokeGuardError {
    fn from(err: csv::Error) -> Self {
        StrokeGuardError::Csv(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for StrokeGuardError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        StrokeGuardError::Unauthorized(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for StrokeGuardError {
    fn from(err: argon2::password_hash::Error) -> Self {
        StrokeGuardError::Internal(format!("Password hashing error: {}", err))
    }
}

impl ResponseError for StrokeGuardError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": error_message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            StrokeGuardError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StrokeGuardError::Validation(_) => StatusCode::BAD_REQUEST,
            StrokeGuardError::RiskFactor(_) => StatusCode::BAD_REQUEST,
            StrokeGuardError::Csv(_) => StatusCode::BAD_REQUEST,
            StrokeGuardError::PatientNotFound(_) => StatusCode::NOT_FOUND,
            StrokeGuardError::UsernameTaken(_) => StatusCode::CONFLICT,
            StrokeGuardError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            StrokeGuardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StrokeGuardError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            StrokeGuardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StrokeGuardError {
    fn error_type(&self) -> &str {
        match self {
            StrokeGuardError::Database(_) => "database_error",
            StrokeGuardError::Validation(_) => "validation_error",
            StrokeGuardError::RiskFactor(_) => "validation_error",
            StrokeGuardError::Csv(_) => "csv_error",
            StrokeGuardError::PatientNotFound(_) => "not_found",
            StrokeGuardError::UsernameTaken(_) => "duplicate_error",
            StrokeGuardError::InvalidCredentials => "invalid_credentials",
            StrokeGuardError::Unauthorized(_) => "unauthorized",
            StrokeGuardError::RateLimitExceeded => "rate_limit",
            StrokeGuardError::Internal(_) => "internal_error",
        }
    }
}

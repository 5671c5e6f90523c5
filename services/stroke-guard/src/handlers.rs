use crate::auth::{AuthService, Claims};
use crate::database::Database;
use crate::errors::StrokeGuardError;
use crate::export::EXPORT_FILENAME;
use crate::metrics;
use crate::middleware::{JwtAuth, RateLimiter};
use crate::models::{
    HealthResponse, LoginRequest, PatientRequest, RegisterRequest, SearchQuery, UserResponse,
};
use crate::services::PatientService;
use actix_web::{http::header, web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Dataset uploads are larger than the default payload limit
const IMPORT_PAYLOAD_LIMIT: usize = 16 * 1024 * 1024;

// ===== Home =====
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": "StrokeGuard AI",
        "description": "Stroke risk screening and patient records",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ===== Health Check =====
pub async fn health_check(db: web::Data<Arc<Database>>) -> HttpResponse {
    let database = match db.health_check().await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "stroke-guard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

// ===== Metrics =====
pub async fn metrics_endpoint() -> Result<HttpResponse, StrokeGuardError> {
    let body = metrics::render().map_err(|e| StrokeGuardError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Auth =====
pub async fn register(
    auth: web::Data<Arc<AuthService>>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, StrokeGuardError> {
    let user = auth.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Account created",
        "user": UserResponse::from(user)
    })))
}

pub async fn login(
    auth: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, StrokeGuardError> {
    let token = auth.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn logout(
    auth: web::Data<Arc<AuthService>>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    auth.logout(&claims);
    HttpResponse::Ok().json(json!({"message": "Logged out"}))
}

// ===== Dashboard =====
pub async fn dashboard(
    service: web::Data<Arc<PatientService>>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, StrokeGuardError> {
    let dashboard = service.dashboard(query.term()).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

// ===== Patients =====
pub async fn list_patients(
    service: web::Data<Arc<PatientService>>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, StrokeGuardError> {
    let patients = service.list_patients(query.term()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "patients": patients,
        "count": patients.len()
    })))
}

pub async fn create_patient(
    service: web::Data<Arc<PatientService>>,
    claims: web::ReqData<Claims>,
    request: web::Json<PatientRequest>,
) -> Result<HttpResponse, StrokeGuardError> {
    let response = service
        .create_patient(request.into_inner(), claims.user_id()?)
        .await?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn get_patient(
    service: web::Data<Arc<PatientService>>,
    patient_id: web::Path<i64>,
) -> Result<HttpResponse, StrokeGuardError> {
    let patient = service.get_patient(*patient_id).await?;
    Ok(HttpResponse::Ok().json(patient))
}

pub async fn update_patient(
    service: web::Data<Arc<PatientService>>,
    patient_id: web::Path<i64>,
    request: web::Json<PatientRequest>,
) -> Result<HttpResponse, StrokeGuardError> {
    let response = service
        .update_patient(*patient_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn delete_patient(
    service: web::Data<Arc<PatientService>>,
    patient_id: web::Path<i64>,
) -> Result<HttpResponse, StrokeGuardError> {
    service.delete_patient(*patient_id).await?;
    Ok(HttpResponse::Ok().json(json!({"message": "Patient record deleted"})))
}

pub async fn export_patients(
    service: web::Data<Arc<PatientService>>,
) -> Result<HttpResponse, StrokeGuardError> {
    let csv = service.export_csv().await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", EXPORT_FILENAME),
        ))
        .body(csv))
}

pub async fn import_patients(
    service: web::Data<Arc<PatientService>>,
    claims: web::ReqData<Claims>,
    body: web::Bytes,
) -> Result<HttpResponse, StrokeGuardError> {
    let summary = service.import_csv(body.as_ref(), claims.user_id()?).await?;
    Ok(HttpResponse::Ok().json(summary))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_limiter: RateLimiter) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        StrokeGuardError::Validation(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        StrokeGuardError::Validation(err.to_string()).into()
    }))
    .route("/", web::get().to(home))
    .route("/health", web::get().to(health_check))
    .route("/metrics", web::get().to(metrics_endpoint))
    .service(
        web::scope("/api/v1/auth")
            .wrap(auth_limiter)
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .service(
                web::resource("/logout")
                    .wrap(JwtAuth::new())
                    .route(web::post().to(logout)),
            ),
    )
    .service(
        web::scope("/api/v1")
            .wrap(JwtAuth::new())
            .route("/dashboard", web::get().to(dashboard))
            .service(
                web::scope("/patients")
                    .route("", web::get().to(list_patients))
                    .route("", web::post().to(create_patient))
                    .route("/export", web::get().to(export_patients))
                    .service(
                        web::resource("/import")
                            .app_data(web::PayloadConfig::new(IMPORT_PAYLOAD_LIMIT))
                            .route(web::post().to(import_patients)),
                    )
                    .route("/{patient_id}", web::get().to(get_patient))
                    .route("/{patient_id}", web::put().to(update_patient))
                    .route("/{patient_id}", web::delete().to(delete_patient)),
            ),
    );
}

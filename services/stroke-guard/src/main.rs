use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use stroke_guard::{
    auth::AuthService, config::Config, database::Database, handlers, middleware::RateLimiter,
    services::PatientService,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("Starting StrokeGuard...");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    config
        .validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    info!("Configuration loaded successfully");

    info!("Opening database at {}", config.database.url);
    let db = match Database::new(&config.database.url, config.database.max_connections).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Database connection failed: {}", e),
            ));
        }
    };

    if let Err(e) = db.health_check().await {
        error!("Database health check failed: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Database not accessible",
        ));
    }
    info!("Database health check passed");

    let auth = Arc::new(AuthService::new(db.clone(), &config.auth));
    let patients = Arc::new(PatientService::new(
        db.clone(),
        config.import.progress_interval,
    ));
    let auth_limiter = RateLimiter::new(config.auth.login_requests_per_minute);

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        let auth_limiter = auth_limiter.clone();
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(auth.clone()))
            .app_data(web::Data::new(patients.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(move |cfg| handlers::configure_routes(cfg, auth_limiter))
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await
}

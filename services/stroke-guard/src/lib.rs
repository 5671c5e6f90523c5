pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod import;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use auth::AuthService;
pub use services::PatientService;

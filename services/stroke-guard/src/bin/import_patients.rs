//! Seed the patient table from the public stroke dataset CSV.
//!
//! Rows are assigned to the doctor named by `import.owner_username`, who must
//! already be registered.

use anyhow::{anyhow, Context};
use dotenv::dotenv;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use stroke_guard::{config::Config, database::Database, services::PatientService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().map_err(|e| anyhow!(e))?;

    info!("--- Starting Data Import ---");

    let db = Arc::new(
        Database::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to open database")?,
    );

    let owner = db
        .find_user_by_username(&config.import.owner_username)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "Import owner {:?} is not registered; create the account first",
                config.import.owner_username
            )
        })?;

    let file = match File::open(&config.import.dataset_path) {
        Ok(file) => file,
        Err(e) => {
            error!(
                "Could not open dataset {:?}: {}",
                config.import.dataset_path, e
            );
            return Err(e).context("Dataset not found");
        }
    };

    let service = PatientService::new(db, config.import.progress_interval);
    let summary = service.import_csv(BufReader::new(file), owner.id).await?;

    info!(
        "SUCCESS! Imported {} patients (high: {}, medium: {}, low: {})",
        summary.imported,
        summary.stats.high_risk,
        summary.stats.medium_risk,
        summary.stats.low_risk
    );

    Ok(())
}

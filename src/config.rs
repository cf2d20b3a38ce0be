use anyhow::{Context, Result};
use moka::future::Cache;
use sea_orm::{Database, DatabaseConnection};
use std::time::Duration;
use tracing::warn;

use crate::credentials::CredentialStore;
use crate::repository::DatasetRepository;
use crate::schemas::AppState;
use crate::sessions::SessionStore;

/// Bootstrap account present on every deployment.
pub const SEED_USERNAME: &str = "admin";
/// Default password for the bootstrap account; rotate it out of band.
pub const SEED_PASSWORD: &str = "admin123";

/// Initialize application state
pub async fn initialize_app_state(database_url: &str, data_dir: &str) -> Result<AppState> {
    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Initialize metrics cache. Stored datasets are immutable (first upload
    // is sticky), so cached results cannot go stale within the TTL.
    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300)) // 5 minutes
        .build();

    Ok(AppState {
        db,
        repo: DatasetRepository::new(data_dir),
        sessions: SessionStore::default(),
        cache,
    })
}

/// Create the bootstrap `admin` account if it does not exist yet.
/// Requires a migrated database (run `init-db` or `migrate-and-serve` first).
pub async fn ensure_seed_admin(db: &DatabaseConnection) -> Result<()> {
    let store = CredentialStore::new(db.clone());

    let existing = store
        .lookup(SEED_USERNAME)
        .await
        .context("failed to look up the seed account; is the database migrated?")?;

    if existing.is_none() {
        store
            .register(SEED_USERNAME, "Administrator", SEED_PASSWORD)
            .await
            .context("failed to create the seed account")?;
        warn!(
            "seed account '{}' created with the default password; rotate it out of band",
            SEED_USERNAME
        );
    }

    Ok(())
}

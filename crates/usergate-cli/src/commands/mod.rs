pub mod db;
pub mod token;
pub mod users;

use std::sync::Arc;

use anyhow::{Context, Result};
use usergate_auth::GrantEngine;
use usergate_auth_postgres::PostgresAuthStorage;

use crate::config::AppConfig;

/// Connects to the database, migrating first when configured to.
pub async fn connect(config: &AppConfig) -> Result<PostgresAuthStorage> {
    let storage = PostgresAuthStorage::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if config.database.run_migrations {
        storage
            .rebuild(&config.seed.clients)
            .await
            .context("failed to migrate database")?;
    }
    Ok(storage)
}

pub fn engine(storage: &PostgresAuthStorage, config: &AppConfig) -> GrantEngine {
    let model = storage.token_model(config.oauth.client_credentials_user_id);
    GrantEngine::new(Arc::new(model), config.oauth.clone())
}

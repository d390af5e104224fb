use anyhow::{Context, Result};
use usergate_auth_postgres::PostgresAuthStorage;
use usergate_auth_postgres::pool::{mask_password, test_connection};

use crate::config::AppConfig;
use crate::output::print_success;

pub async fn migrate(config: &AppConfig) -> Result<()> {
    let storage = PostgresAuthStorage::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", mask_password(&config.database.url)))?;
    test_connection(storage.pool()).await?;

    let outcome = storage
        .rebuild(&config.seed.clients)
        .await
        .context("failed to migrate database")?;

    if outcome.fresh {
        print_success(&format!(
            "Database created, {} client(s) seeded",
            outcome.seeded
        ));
    } else {
        print_success("Database is up to date");
    }
    Ok(())
}

//! Embedded schema migrations.
//!
//! Migrations are compiled into the binary and tracked in `_sqlx_migrations`.
//! To add one, create the SQL file under `migrations/` and append an entry
//! to `embedded_migrations!`.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use sqlx_core::query_scalar::query_scalar;
use tracing::{error, info, instrument};

use crate::seed::{SeedClient, seed_clients};
use crate::{PgPool, StorageError, StorageResult};

/// Table in which applied migrations are recorded.
pub const MIGRATIONS_TABLE: &str = "_sqlx_migrations";

macro_rules! embedded_migrations {
    () => {
        &[(
            20171015000001i64,
            "initial_schema",
            include_str!("../migrations/20171015000001_initial_schema.sql"),
        )]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// What [`rebuild`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// `true` if the database had never been migrated.
    pub fresh: bool,
    /// Number of seed clients inserted.
    pub seeded: u64,
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns `StorageError::Migration` if a migration fails to apply.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> StorageResult<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running database migrations (embedded)");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| StorageError::migration(e.to_string()))?;

    info!("Database migrations completed");
    Ok(())
}

/// Returns `true` if the migrations table exists.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub async fn is_migrated(pool: &PgPool) -> StorageResult<bool> {
    let exists: bool = query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(MIGRATIONS_TABLE)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Runs migrations, then seeds clients if the database was never migrated.
///
/// # Errors
///
/// Returns an error if a migration or seed fails. The failure is logged
/// before it is returned.
#[instrument(skip_all, fields(seed_clients = seeds.len()))]
pub async fn rebuild(pool: &PgPool, seeds: &[SeedClient]) -> StorageResult<RebuildOutcome> {
    let result: StorageResult<RebuildOutcome> = async {
        let fresh = !is_migrated(pool).await?;
        run(pool).await?;

        let seeded = if fresh { seed_clients(pool, seeds).await? } else { 0 };
        Ok::<_, StorageError>(RebuildOutcome { fresh, seeded })
    }
    .await;

    match &result {
        Ok(outcome) => info!(fresh = outcome.fresh, seeded = outcome.seeded, "Rebuild complete"),
        Err(e) => error!(error = %e, "Rebuild failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());
        assert!(
            migrations
                .windows(2)
                .all(|pair| pair[0].version < pair[1].version)
        );
    }

    #[test]
    fn test_initial_schema_has_unique_token_indexes() {
        let migrations = build_migrations();
        let sql = &migrations[0].sql;
        assert!(sql.contains("UNIQUE INDEX IF NOT EXISTS idx_oauth_token_access_token"));
        assert!(sql.contains("UNIQUE INDEX IF NOT EXISTS idx_oauth_token_refresh_token"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }
}

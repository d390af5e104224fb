//! PostgreSQL storage backend for usergate-auth
//!
//! Provides persistent storage for:
//!
//! - Users (`"user"` table, read-only)
//! - OAuth clients (`oauth_client` table, read-only apart from seeding)
//! - Issued tokens (`oauth_token` table)
//!
//! The connection pool is constructed explicitly and injected; nothing here
//! holds a process-wide connection.
//!
//! # Example
//!
//! ```ignore
//! use usergate_auth_postgres::{PostgresAuthStorage, PostgresConfig};
//!
//! let storage = PostgresAuthStorage::connect(&PostgresConfig::new(url)).await?;
//! storage.rebuild(&seed_clients).await?;
//!
//! let model = storage.token_model(Some(1));
//! ```

pub mod client;
pub mod config;
pub mod migrations;
pub mod pool;
pub mod scope;
pub mod seed;
pub mod storage_adapters;
pub mod token;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

use usergate_auth::AuthError;
use usergate_auth::oauth::TokenModel;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use client::ClientStorage;
pub use config::PostgresConfig;
pub use pool::create_pool;
pub use scope::{FieldMap, Pagination, TableScope, table_name_for};
pub use seed::SeedClient;
pub use storage_adapters::{ArcClientStorage, ArcTokenStorage, ArcUserStorage};
pub use token::TokenStorage;
pub use user::UserStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during auth storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Resource already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a `Migration` error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is an invalid input error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::InvalidInput(_))
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Migration(_))
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => AuthError::conflict(message),
            other => AuthError::storage(other.to_string()),
        }
    }
}

/// Returns `true` if a sqlx error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx_core::Error) -> bool {
    matches!(err, sqlx_core::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// PostgreSQL Auth Storage
// =============================================================================

/// PostgreSQL storage backend for authentication data.
///
/// Holds a connection pool and hands out storage types for each entity.
#[derive(Debug, Clone)]
pub struct PostgresAuthStorage {
    pool: Arc<PgPool>,
}

impl PostgresAuthStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage by building a pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(config: &PostgresConfig) -> StorageResult<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the Arc-wrapped pool.
    #[must_use]
    pub fn pool_arc(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// Runs migrations and, on a fresh database, the configured seeds.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration or seed insert fails.
    pub async fn rebuild(&self, seeds: &[SeedClient]) -> StorageResult<migrations::RebuildOutcome> {
        migrations::rebuild(&self.pool, seeds).await
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> UserStorage<'_> {
        UserStorage::new(&self.pool)
    }

    /// Get client storage operations.
    #[must_use]
    pub fn clients(&self) -> ClientStorage<'_> {
        ClientStorage::new(&self.pool)
    }

    /// Get token storage operations.
    #[must_use]
    pub fn tokens(&self) -> TokenStorage<'_> {
        TokenStorage::new(&self.pool)
    }

    /// Builds a token model over Arc-owning adapters sharing this pool.
    #[must_use]
    pub fn token_model(&self, client_credentials_user_id: Option<i64>) -> TokenModel {
        TokenModel::new(
            Arc::new(ArcUserStorage::new(self.pool_arc())),
            Arc::new(ArcClientStorage::new(self.pool_arc())),
            Arc::new(ArcTokenStorage::new(self.pool_arc())),
            client_credentials_user_id,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conflict() {
        let err = StorageError::conflict("duplicate access token");
        assert!(err.is_conflict());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "Conflict: duplicate access token");
    }

    #[test]
    fn test_storage_error_invalid_input() {
        let err = StorageError::invalid_input("Unknown user field: password");
        assert!(err.is_invalid_input());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_error_migration() {
        let err = StorageError::migration("checksum mismatch");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_conflict_maps_to_auth_conflict() {
        let err: AuthError = StorageError::conflict("duplicate access token").into();
        assert!(err.is_conflict());

        let err: AuthError = StorageError::invalid_input("bad").into();
        assert!(matches!(err, AuthError::Storage { .. }));
    }
}

//! Token storage.
//!
//! One row per issued access token. Expiries are Unix seconds. Access and
//! refresh token values carry unique indexes, so a collision surfaces as
//! [`StorageError::Conflict`](crate::StorageError::Conflict).

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use tracing::instrument;

use usergate_auth::types::{NewToken, StoredToken};

use crate::scope::{FieldMap, TableScope};
use crate::{PgPool, StorageError, StorageResult, is_unique_violation};

/// Table holding issued tokens.
pub const TOKEN_TABLE: &str = "oauth_token";

/// Field map of the `oauth_token` table.
pub static TOKEN_FIELDS: FieldMap = FieldMap::new(
    "oauth_token",
    &[
        ("id", "id"),
        ("accessToken", "access_token"),
        ("accessTokenExpiresAt", "access_token_expires_at"),
        ("refreshToken", "refresh_token"),
        ("refreshTokenExpiresAt", "refresh_token_expires_at"),
        ("userId", "user_id"),
        ("clientId", "client_id"),
        ("scope", "scope"),
    ],
);

const ROW_FIELDS: &[&str] = &[
    "id",
    "accessToken",
    "accessTokenExpiresAt",
    "refreshToken",
    "refreshTokenExpiresAt",
    "userId",
    "clientId",
    "scope",
];

const INSERT_FIELDS: &[&str] = &[
    "accessToken",
    "accessTokenExpiresAt",
    "refreshToken",
    "refreshTokenExpiresAt",
    "userId",
    "clientId",
    "scope",
];

type TokenTuple = (
    i64,
    String,
    Option<i64>,
    Option<String>,
    Option<i64>,
    Option<i64>,
    String,
    Option<String>,
);

fn from_tuple(row: TokenTuple) -> StoredToken {
    StoredToken {
        id: row.0,
        access_token: row.1,
        access_token_expires_at: row.2,
        refresh_token: row.3,
        refresh_token_expires_at: row.4,
        user_id: row.5,
        client_id: row.6,
        scope: row.7,
    }
}

// =============================================================================
// Token Storage
// =============================================================================

/// Token storage operations.
pub struct TokenStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenStorage<'a> {
    /// Create a new token storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns the table scope for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the field map is invalid.
    pub fn scope() -> StorageResult<TableScope> {
        TableScope::new(TOKEN_TABLE, &TOKEN_FIELDS)
    }

    async fn find_by(&self, field: &str, value: &str) -> StorageResult<Option<StoredToken>> {
        let sql = Self::scope()?.select(ROW_FIELDS, &[field])?;
        let row: Option<TokenTuple> = query_as(&sql)
            .bind(value)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(from_tuple))
    }

    /// Find a token by access token value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip_all)]
    pub async fn find_by_access_token(&self, access_token: &str) -> StorageResult<Option<StoredToken>> {
        self.find_by("accessToken", access_token).await
    }

    /// Find a token by refresh token value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip_all)]
    pub async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> StorageResult<Option<StoredToken>> {
        self.find_by("refreshToken", refresh_token).await
    }

    /// Insert a token and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a token value already exists, or
    /// a database error if the insert fails.
    #[instrument(skip_all, fields(client_id = %token.client_id, user_id = ?token.user_id))]
    pub async fn create(&self, token: &NewToken) -> StorageResult<StoredToken> {
        let sql = Self::scope()?.insert(INSERT_FIELDS, ROW_FIELDS)?;

        let row: TokenTuple = query_as::<Postgres, TokenTuple>(&sql)
            .bind(&token.access_token)
            .bind(token.access_token_expires_at)
            .bind(token.refresh_token.as_deref())
            .bind(token.refresh_token_expires_at)
            .bind(token.user_id)
            .bind(&token.client_id)
            .bind(token.scope.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return StorageError::conflict("Token value already exists");
                }
                StorageError::from(e)
            })?;

        Ok(from_tuple(row))
    }

    /// Delete at most one token carrying `refresh_token`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    #[instrument(skip_all)]
    pub async fn delete_by_refresh_token(&self, refresh_token: &str) -> StorageResult<u64> {
        let sql = Self::scope()?.delete_one("refreshToken")?;
        let result = query::<Postgres>(&sql)
            .bind(refresh_token)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_field_map_is_valid() {
        assert!(TokenStorage::scope().is_ok());
    }

    #[test]
    fn test_insert_sql_returns_row() {
        let sql = TokenStorage::scope()
            .unwrap()
            .insert(INSERT_FIELDS, &["id", "userId"])
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"oauth_token\" (access_token, access_token_expires_at, refresh_token, \
             refresh_token_expires_at, user_id, client_id, scope) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id, user_id"
        );
    }
}

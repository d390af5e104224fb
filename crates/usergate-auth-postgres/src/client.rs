//! OAuth client storage.
//!
//! Clients are reference data: looked up by id (and optionally secret) and
//! inserted only by seeding. Redirect URIs and grants are stored as
//! comma/space delimited strings.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use tracing::instrument;

use usergate_auth::types::{Client, GrantType, join_grants};

use crate::scope::{FieldMap, TableScope};
use crate::{PgPool, StorageResult};

/// Table holding OAuth clients.
pub const CLIENT_TABLE: &str = "oauth_client";

/// Field map of the `oauth_client` table.
pub static CLIENT_FIELDS: FieldMap = FieldMap::new(
    "oauth_client",
    &[
        ("id", "id"),
        ("clientId", "client_id"),
        ("clientSecret", "client_secret"),
        ("redirectUri", "redirect_uri"),
        ("grants", "grants"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
);

const CLIENT_COLUMNS: &[&str] = &["clientId", "redirectUri", "grants"];

// =============================================================================
// Client Storage
// =============================================================================

/// Client storage operations.
pub struct ClientStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientStorage<'a> {
    /// Create a new client storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns the table scope for clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the field map is invalid.
    pub fn scope() -> StorageResult<TableScope> {
        TableScope::new(CLIENT_TABLE, &CLIENT_FIELDS)
    }

    /// Find a client by id and, when given, secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_secret), fields(with_secret = client_secret.is_some()))]
    pub async fn find(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> StorageResult<Option<Client>> {
        let scope = Self::scope()?;

        let row: Option<(String, String, String)> = match client_secret {
            Some(secret) => {
                let sql = scope.select(CLIENT_COLUMNS, &["clientId", "clientSecret"])?;
                query_as::<Postgres, (String, String, String)>(&sql)
                    .bind(client_id)
                    .bind(secret)
                    .fetch_optional(self.pool)
                    .await?
            }
            None => {
                let sql = scope.select(CLIENT_COLUMNS, &["clientId"])?;
                query_as::<Postgres, (String, String, String)>(&sql)
                    .bind(client_id)
                    .fetch_optional(self.pool)
                    .await?
            }
        };

        Ok(row.map(|(id, redirect_uri, grants)| Client::from_stored(id, &redirect_uri, &grants)))
    }

    /// Insert a client unless its id or secret already exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    #[instrument(skip(self, client_secret, redirect_uris))]
    pub async fn insert_if_absent(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uris: &[String],
        grants: &[GrantType],
    ) -> StorageResult<bool> {
        let scope = Self::scope()?;
        let sql = format!(
            "{} ON CONFLICT DO NOTHING",
            scope.insert(&["clientId", "clientSecret", "redirectUri", "grants"], &[])?
        );

        let result = query::<Postgres>(&sql)
            .bind(client_id)
            .bind(client_secret)
            .bind(redirect_uris.join(","))
            .bind(join_grants(grants))
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_field_map_is_valid() {
        assert!(ClientStorage::scope().is_ok());
    }

    #[test]
    fn test_lookup_sql() {
        let scope = ClientStorage::scope().unwrap();
        assert_eq!(
            scope
                .select(CLIENT_COLUMNS, &["clientId", "clientSecret"])
                .unwrap(),
            "SELECT client_id, redirect_uri, grants FROM \"oauth_client\" \
             WHERE client_id = $1 AND client_secret = $2"
        );
    }
}

//! User storage.
//!
//! Users are read-only here. Lookups filter on an allow-list of
//! `{id, username, passwordHash}`; the digest is computed by
//! [`UserQuery::with_password`] before a query is ever built.

use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;
use tracing::instrument;

use usergate_auth::types::{USER_FIND_LIMIT, UserQuery, UserRecord};

use crate::scope::{FieldMap, Pagination, TableScope};
use crate::{PgPool, StorageResult};

/// Table holding users.
pub const USER_TABLE: &str = "user";

/// Field map of the `"user"` table.
pub static USER_FIELDS: FieldMap = FieldMap::new(
    "user",
    &[
        ("id", "id"),
        ("name", "name"),
        ("username", "username"),
        ("passwordHash", "password_hash"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
);

const LISTING_FIELDS: &[&str] = &["id", "name", "username"];
const DETAIL_FIELDS: &[&str] = &["id", "name", "username", "createdAt", "updatedAt"];

type ListingTuple = (i64, String, String);
type DetailTuple = (i64, String, String, OffsetDateTime, Option<OffsetDateTime>);

/// Binds the present predicates of a [`UserQuery`] in filter order.
macro_rules! bind_user_filters {
    ($q:expr, $query:expr) => {{
        let mut q = $q;
        if let Some(id) = $query.id {
            q = q.bind(id);
        }
        if let Some(username) = $query.username.as_deref() {
            q = q.bind(username);
        }
        if let Some(password) = $query.password.as_ref() {
            q = q.bind(password.as_str());
        }
        q
    }};
}

fn filter_fields(query: &UserQuery) -> Vec<&'static str> {
    let mut filters = Vec::with_capacity(3);
    if query.id.is_some() {
        filters.push("id");
    }
    if query.username.is_some() {
        filters.push("username");
    }
    if query.password.is_some() {
        filters.push("passwordHash");
    }
    filters
}

// =============================================================================
// User Storage
// =============================================================================

/// User storage operations.
pub struct UserStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStorage<'a> {
    /// Create a new user storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns the table scope for users.
    ///
    /// # Errors
    ///
    /// Returns an error if the field map is invalid.
    pub fn scope() -> StorageResult<TableScope> {
        TableScope::new(USER_TABLE, &USER_FIELDS)
    }

    /// Find up to 50 users matching every predicate of `query`.
    ///
    /// Without an id only `{id, name, username}` are selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, query), fields(
        by_id = query.id.is_some(),
        by_username = query.username.is_some(),
        by_password = query.password.is_some(),
    ))]
    pub async fn find(&self, query: &UserQuery) -> StorageResult<Vec<UserRecord>> {
        let scope = Self::scope()?;
        let filters = filter_fields(query);

        if query.is_listing() {
            let sql = format!(
                "{} ORDER BY id LIMIT {}",
                scope.select(LISTING_FIELDS, &filters)?,
                USER_FIND_LIMIT
            );
            let rows: Vec<ListingTuple> =
                bind_user_filters!(query_as::<Postgres, ListingTuple>(&sql), query)
                    .fetch_all(self.pool)
                    .await?;

            return Ok(rows
                .into_iter()
                .map(|(id, name, username)| UserRecord::listing(id, name, username))
                .collect());
        }

        let sql = format!(
            "{} ORDER BY id LIMIT {}",
            scope.select(DETAIL_FIELDS, &filters)?,
            USER_FIND_LIMIT
        );
        let rows: Vec<DetailTuple> =
            bind_user_filters!(query_as::<Postgres, DetailTuple>(&sql), query)
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, username, created_at, updated_at)| {
                UserRecord::detail(id, name, username, created_at, updated_at)
            })
            .collect())
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> StorageResult<Option<UserRecord>> {
        let users = self.find(&UserQuery::new().with_id(id)).await?;
        Ok(users.into_iter().next())
    }

    /// List users in the `{id, name, username}` projection, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: i64) -> StorageResult<Vec<UserRecord>> {
        let scope = Self::scope()?;
        let sql = format!(
            "{} ORDER BY id LIMIT $1 OFFSET $2",
            scope.select(LISTING_FIELDS, &[])?
        );

        let rows: Vec<ListingTuple> = query_as(&sql)
            .bind(limit.max(0))
            .bind(offset.max(0))
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, username)| UserRecord::listing(id, name, username))
            .collect())
    }

    /// List one page of users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_page(&self, page: Pagination) -> StorageResult<Vec<UserRecord>> {
        self.list(page.limit(), page.offset()).await
    }
}

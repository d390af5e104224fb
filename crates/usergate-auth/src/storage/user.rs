//! User storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{UserQuery, UserRecord};

/// Read-only storage operations for users.
///
/// Implementations never return password digests.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find up to [`USER_FIND_LIMIT`](crate::types::USER_FIND_LIMIT) users
    /// matching every predicate of `query`.
    ///
    /// When `query.id` is absent only `{id, name, username}` are populated.
    /// No match yields an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, query: &UserQuery) -> AuthResult<Vec<UserRecord>>;

    /// List users in the `{id, name, username}` projection.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of users to return
    /// * `offset` - Number of users to skip for pagination
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<UserRecord>>;
}

//! Token storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{NewToken, StoredToken};

/// Storage operations for issued tokens.
///
/// Tokens are looked up by exact value and deleted on revocation.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Find a token row by access token value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_access_token(&self, access_token: &str) -> AuthResult<Option<StoredToken>>;

    /// Find a token row by refresh token value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_refresh_token(&self, refresh_token: &str)
    -> AuthResult<Option<StoredToken>>;

    /// Insert a token row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the access or refresh token value
    /// already exists, or a storage error if the insert fails.
    async fn create(&self, token: &NewToken) -> AuthResult<StoredToken>;

    /// Delete at most one row carrying the given refresh token.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_refresh_token(&self, refresh_token: &str) -> AuthResult<u64>;
}

//! Arc-owning storage adapters.
//!
//! These adapters wrap the lifetime-based storage types and own an
//! `Arc<PgPool>`, allowing them to be used as `Arc<dyn Storage>` by the
//! token model.

use std::sync::Arc;

use async_trait::async_trait;

use usergate_auth::AuthResult;
use usergate_auth::storage::{
    ClientStorage as ClientStorageTrait, TokenStorage as TokenStorageTrait,
    UserStorage as UserStorageTrait,
};
use usergate_auth::types::{Client, NewToken, StoredToken, UserQuery, UserRecord};

use crate::PgPool;
use crate::client::ClientStorage;
use crate::token::TokenStorage;
use crate::user::UserStorage;

// =============================================================================
// Arc-Owning User Storage
// =============================================================================

/// Arc-owning PostgreSQL user storage adapter.
#[derive(Clone)]
pub struct ArcUserStorage {
    pool: Arc<PgPool>,
}

impl ArcUserStorage {
    /// Create a new Arc-owning user storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorageTrait for ArcUserStorage {
    async fn find(&self, query: &UserQuery) -> AuthResult<Vec<UserRecord>> {
        let storage = UserStorage::new(&self.pool);
        Ok(storage.find(query).await?)
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<UserRecord>> {
        let storage = UserStorage::new(&self.pool);
        Ok(storage.list(limit, offset).await?)
    }
}

// =============================================================================
// Arc-Owning Client Storage
// =============================================================================

/// Arc-owning PostgreSQL client storage adapter.
#[derive(Clone)]
pub struct ArcClientStorage {
    pool: Arc<PgPool>,
}

impl ArcClientStorage {
    /// Create a new Arc-owning client storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStorageTrait for ArcClientStorage {
    async fn find(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AuthResult<Option<Client>> {
        let storage = ClientStorage::new(&self.pool);
        Ok(storage.find(client_id, client_secret).await?)
    }
}

// =============================================================================
// Arc-Owning Token Storage
// =============================================================================

/// Arc-owning PostgreSQL token storage adapter.
#[derive(Clone)]
pub struct ArcTokenStorage {
    pool: Arc<PgPool>,
}

impl ArcTokenStorage {
    /// Create a new Arc-owning token storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStorageTrait for ArcTokenStorage {
    async fn find_by_access_token(&self, access_token: &str) -> AuthResult<Option<StoredToken>> {
        let storage = TokenStorage::new(&self.pool);
        Ok(storage.find_by_access_token(access_token).await?)
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> AuthResult<Option<StoredToken>> {
        let storage = TokenStorage::new(&self.pool);
        Ok(storage.find_by_refresh_token(refresh_token).await?)
    }

    async fn create(&self, token: &NewToken) -> AuthResult<StoredToken> {
        let storage = TokenStorage::new(&self.pool);
        Ok(storage.create(token).await?)
    }

    async fn delete_by_refresh_token(&self, refresh_token: &str) -> AuthResult<u64> {
        let storage = TokenStorage::new(&self.pool);
        Ok(storage.delete_by_refresh_token(refresh_token).await?)
    }
}

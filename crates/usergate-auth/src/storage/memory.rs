//! In-memory storage implementations for tests.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::types::{Client, NewToken, StoredToken, USER_FIND_LIMIT, User, UserQuery, UserRecord};
use crate::{AuthError, AuthResult};

use super::{ClientStorage, TokenStorage, UserStorage};

fn poisoned<T>(_: T) -> AuthError {
    AuthError::internal("in-memory storage lock poisoned")
}

// =============================================================================
// Users
// =============================================================================

/// In-memory user storage.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStorage {
    /// Creates storage holding the given users.
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find(&self, query: &UserQuery) -> AuthResult<Vec<UserRecord>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .filter(|user| query.matches(user))
            .take(USER_FIND_LIMIT as usize)
            .map(|user| {
                if query.is_listing() {
                    UserRecord::listing(user.id, user.name.clone(), user.username.clone())
                } else {
                    UserRecord::from(user.clone())
                }
            })
            .collect())
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<UserRecord>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|user| UserRecord::listing(user.id, user.name.clone(), user.username.clone()))
            .collect())
    }
}

// =============================================================================
// Clients
// =============================================================================

/// In-memory client storage. Each client is stored with its secret.
#[derive(Debug, Default)]
pub struct InMemoryClientStorage {
    clients: RwLock<Vec<(Client, String)>>,
}

impl InMemoryClientStorage {
    /// Creates storage holding the given `(client, secret)` pairs.
    #[must_use]
    pub fn new(clients: Vec<(Client, String)>) -> Self {
        Self {
            clients: RwLock::new(clients),
        }
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn find(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AuthResult<Option<Client>> {
        let clients = self.clients.read().map_err(poisoned)?;
        Ok(clients
            .iter()
            .find(|(client, secret)| {
                client.id == client_id && client_secret.is_none_or(|s| s == secret)
            })
            .map(|(client, _)| client.clone()))
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// In-memory token storage enforcing unique access and refresh tokens.
#[derive(Debug, Default)]
pub struct InMemoryTokenStorage {
    tokens: RwLock<Vec<StoredToken>>,
}

impl InMemoryTokenStorage {
    /// Creates empty token storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn rows(&self) -> AuthResult<Vec<StoredToken>> {
        Ok(self.tokens.read().map_err(poisoned)?.clone())
    }
}

#[async_trait]
impl TokenStorage for InMemoryTokenStorage {
    async fn find_by_access_token(&self, access_token: &str) -> AuthResult<Option<StoredToken>> {
        let tokens = self.tokens.read().map_err(poisoned)?;
        Ok(tokens
            .iter()
            .find(|t| t.access_token == access_token)
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> AuthResult<Option<StoredToken>> {
        let tokens = self.tokens.read().map_err(poisoned)?;
        Ok(tokens
            .iter()
            .find(|t| t.refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn create(&self, token: &NewToken) -> AuthResult<StoredToken> {
        let mut tokens = self.tokens.write().map_err(poisoned)?;

        let collides = tokens.iter().any(|t| {
            t.access_token == token.access_token
                || (token.refresh_token.is_some() && t.refresh_token == token.refresh_token)
        });
        if collides {
            return Err(AuthError::conflict("Token value already exists"));
        }

        let row = StoredToken {
            id: tokens.iter().map(|t| t.id).max().unwrap_or(0) + 1,
            access_token: token.access_token.clone(),
            access_token_expires_at: Some(token.access_token_expires_at),
            refresh_token: token.refresh_token.clone(),
            refresh_token_expires_at: token.refresh_token_expires_at,
            user_id: token.user_id,
            client_id: token.client_id.clone(),
            scope: token.scope.clone(),
        };
        tokens.push(row.clone());
        Ok(row)
    }

    async fn delete_by_refresh_token(&self, refresh_token: &str) -> AuthResult<u64> {
        let mut tokens = self.tokens.write().map_err(poisoned)?;
        match tokens
            .iter()
            .position(|t| t.refresh_token.as_deref() == Some(refresh_token))
        {
            Some(index) => {
                tokens.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

//! The storage-side contract of the grant engine.
//!
//! [`OAuth2Model`] is the set of callbacks the grant engine needs from
//! persistence. [`TokenModel`] implements it over the storage traits and
//! owns the token lifecycle; users and clients are only ever read.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::storage::{ClientStorage, TokenStorage, UserStorage};
use crate::types::{
    AccessToken, Client, ClientPrincipal, GrantType, IssuedToken, NewToken, Principal,
    RefreshToken, SavedToken, UserQuery, UserRecord,
};
use crate::AuthResult;

/// Storage callbacks consumed by the grant engine.
///
/// Lookups that find nothing return `Ok(None)`. Errors are reserved for
/// protocol violations and storage failures.
#[async_trait]
pub trait OAuth2Model: Send + Sync {
    /// Exact-match lookup of an access token.
    async fn get_access_token(&self, access_token: &str) -> AuthResult<Option<AccessToken>>;

    /// Exact-match lookup of a refresh token.
    ///
    /// Expiry is not checked; the caller validates `refresh_token_expires_at`.
    async fn get_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Lookup of a client by id and, when given, secret.
    async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AuthResult<Option<Client>>;

    /// Lookup of a user by credentials. The password is hashed before it
    /// reaches storage.
    async fn get_user(&self, username: &str, password: &str) -> AuthResult<Option<UserRecord>>;

    /// Persists a freshly issued token and returns the stored row.
    async fn save_token(
        &self,
        token: &IssuedToken,
        client: &Client,
        principal: &Principal,
    ) -> AuthResult<SavedToken>;

    /// Synthesizes the identity of a client acting on its own behalf.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` if the client lacks the
    /// `client_credentials` grant.
    async fn get_user_from_client(&self, client: &Client) -> AuthResult<ClientPrincipal>;

    /// Deletes the token carrying `refresh_token`.
    ///
    /// Returns `false` when nothing matched.
    async fn revoke_token(&self, refresh_token: &str) -> AuthResult<bool>;
}

// =============================================================================
// Token Model
// =============================================================================

/// [`OAuth2Model`] backed by the storage traits.
#[derive(Clone)]
pub struct TokenModel {
    users: Arc<dyn UserStorage>,
    clients: Arc<dyn ClientStorage>,
    tokens: Arc<dyn TokenStorage>,
    client_credentials_user_id: Option<i64>,
}

impl TokenModel {
    /// Creates a model over the given storages.
    ///
    /// `client_credentials_user_id` is the user id recorded on tokens issued
    /// to a client acting on its own behalf.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStorage>,
        clients: Arc<dyn ClientStorage>,
        tokens: Arc<dyn TokenStorage>,
        client_credentials_user_id: Option<i64>,
    ) -> Self {
        Self {
            users,
            clients,
            tokens,
            client_credentials_user_id,
        }
    }

    fn user_id_for(&self, principal: &Principal) -> Option<i64> {
        match principal {
            Principal::User { id } => Some(*id),
            Principal::Client(_) => self.client_credentials_user_id,
        }
    }
}

impl std::fmt::Debug for TokenModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenModel")
            .field("client_credentials_user_id", &self.client_credentials_user_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OAuth2Model for TokenModel {
    async fn get_access_token(&self, access_token: &str) -> AuthResult<Option<AccessToken>> {
        let row = self.tokens.find_by_access_token(access_token).await?;
        tracing::debug!(found = row.is_some(), "Access token lookup");
        Ok(row.map(AccessToken::from))
    }

    async fn get_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = self.tokens.find_by_refresh_token(refresh_token).await?;
        tracing::debug!(found = row.is_some(), "Refresh token lookup");
        Ok(row.and_then(RefreshToken::from_stored))
    }

    async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AuthResult<Option<Client>> {
        let client = self.clients.find(client_id, client_secret).await?;
        tracing::debug!(
            client_id = %client_id,
            with_secret = client_secret.is_some(),
            found = client.is_some(),
            "Client lookup"
        );
        Ok(client)
    }

    async fn get_user(&self, username: &str, password: &str) -> AuthResult<Option<UserRecord>> {
        let query = UserQuery::new()
            .with_username(username)
            .with_password(password);
        let user = self.users.find(&query).await?.into_iter().next();
        tracing::debug!(username = %username, found = user.is_some(), "User lookup");
        Ok(user)
    }

    async fn save_token(
        &self,
        token: &IssuedToken,
        client: &Client,
        principal: &Principal,
    ) -> AuthResult<SavedToken> {
        let row = NewToken {
            access_token: token.access_token.clone(),
            access_token_expires_at: token.access_token_expires_at.unix_timestamp(),
            refresh_token: token.refresh_token.clone(),
            refresh_token_expires_at: token
                .refresh_token_expires_at
                .map(|exp| exp.unix_timestamp()),
            user_id: self.user_id_for(principal),
            client_id: client.id.clone(),
            scope: token.scope.clone(),
        };

        let stored = self.tokens.create(&row).await?;
        tracing::info!(
            token_id = stored.id,
            client_id = %stored.client_id,
            user_id = ?stored.user_id,
            with_refresh = stored.refresh_token.is_some(),
            "Token saved"
        );
        Ok(SavedToken::from(stored))
    }

    async fn get_user_from_client(&self, client: &Client) -> AuthResult<ClientPrincipal> {
        if !client.is_grant_type_allowed(GrantType::ClientCredentials) {
            return Err(AuthError::invalid_grant("Invalid grant authentication flow"));
        }

        let stored = self
            .clients
            .find_by_client_id(&client.id)
            .await?
            .ok_or_else(|| AuthError::invalid_client(format!("Client not found: {}", client.id)))?;

        Ok(ClientPrincipal {
            id: client.id.clone(),
            client_id: stored.id,
            grants: client.grants.clone(),
        })
    }

    async fn revoke_token(&self, refresh_token: &str) -> AuthResult<bool> {
        let deleted = self.tokens.delete_by_refresh_token(refresh_token).await?;
        tracing::info!(revoked = deleted > 0, "Refresh token revocation");
        Ok(deleted > 0)
    }
}

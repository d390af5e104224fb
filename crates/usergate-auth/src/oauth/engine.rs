//! Grant engine and bearer authentication.
//!
//! The engine owns the protocol decisions: which grant a client may use,
//! expiry enforcement, scope negotiation, and refresh token rotation. All
//! persistence goes through [`OAuth2Model`].

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::types::{AuthContext, Client, GrantType, IssuedToken, Principal, generate_token};
use crate::AuthResult;

use super::model::OAuth2Model;
use super::token::{TokenRequest, TokenResponse};

// =============================================================================
// Authentication
// =============================================================================

/// Options for [`Authenticator::authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticateOptions {
    /// Space-separated scope the token must carry.
    pub scope: Option<String>,
    /// Resolve client errors to an unauthenticated context instead of failing.
    pub continue_on_failure: bool,
}

impl AuthenticateOptions {
    /// Requires the given scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Continues with an unauthenticated context when validation fails.
    #[must_use]
    pub fn continue_on_failure(mut self) -> Self {
        self.continue_on_failure = true;
        self
    }
}

/// Resolves a bearer token into the identity presenting it.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validates `bearer` (a raw token or an `Authorization` header value).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for a missing token,
    /// `AuthError::InvalidToken` for an unknown one, `AuthError::TokenExpired`,
    /// or `AuthError::InsufficientScope`, unless
    /// [`AuthenticateOptions::continue_on_failure`] is set.
    async fn authenticate(
        &self,
        bearer: &str,
        options: &AuthenticateOptions,
    ) -> AuthResult<AuthContext>;
}

// =============================================================================
// Grant Engine
// =============================================================================

/// Minimal RFC 6749 token endpoint over an [`OAuth2Model`].
#[derive(Clone)]
pub struct GrantEngine {
    model: Arc<dyn OAuth2Model>,
    config: OAuthConfig,
}

impl GrantEngine {
    /// Creates an engine over the given model.
    #[must_use]
    pub fn new(model: Arc<dyn OAuth2Model>, config: OAuthConfig) -> Self {
        Self { model, config }
    }

    /// Returns the model backing this engine.
    #[must_use]
    pub fn model(&self) -> &Arc<dyn OAuth2Model> {
        &self.model
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Handles a token request.
    ///
    /// # Errors
    ///
    /// A refresh_token grant consumes the presented refresh token only after
    /// its replacement is stored, so a failed save leaves it usable.
    ///
    /// Returns the RFC 6749 error for the failed step: `UnsupportedGrantType`,
    /// `InvalidRequest`, `InvalidClient`, `UnauthorizedClient`, `InvalidGrant`,
    /// or `InvalidScope`. Storage failures propagate unchanged.
    pub async fn issue_token(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        let grant_type: GrantType = request
            .grant_type
            .parse()
            .map_err(|_| AuthError::unsupported_grant_type(&request.grant_type))?;

        let client_id = required(request.client_id.as_deref(), "client_id")?;
        let client_secret = request
            .client_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AuthError::invalid_client("client authentication is required"))?;
        let client = self
            .model
            .get_client(client_id, Some(client_secret))
            .await?
            .ok_or_else(|| AuthError::invalid_client("client is invalid"))?;

        if !client.is_grant_type_allowed(grant_type) {
            tracing::warn!(
                client_id = %client.id,
                grant_type = %grant_type,
                "Grant type not allowed for client"
            );
            return Err(AuthError::unauthorized_client("`grant_type` is invalid"));
        }

        let (principal, scope) = match grant_type {
            GrantType::Password => self.password_grant(request).await?,
            GrantType::ClientCredentials => self.client_credentials_grant(&client, request).await?,
            GrantType::RefreshToken => self.refresh_token_grant(&client, request).await?,
        };

        let with_refresh = grant_type != GrantType::ClientCredentials
            && (client.is_grant_type_allowed(GrantType::RefreshToken)
                || self.config.always_issue_refresh_token);

        let token = self.persist(&client, &principal, scope, with_refresh).await?;

        if grant_type == GrantType::RefreshToken {
            self.consume_refresh_token(request, &token).await?;
        }

        tracing::info!(
            client_id = %client.id,
            grant_type = %grant_type,
            user_id = ?principal.user_id(),
            "Token issued"
        );

        Ok(
            TokenResponse::new(token.access_token, self.config.access_token_lifetime.as_secs())
                .with_refresh_token(token.refresh_token)
                .with_scope(token.scope),
        )
    }

    /// Revokes the token carrying `refresh_token`.
    ///
    /// Returns `false` if no token matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn revoke_token(&self, refresh_token: &str) -> AuthResult<bool> {
        self.model.revoke_token(refresh_token).await
    }

    async fn password_grant(
        &self,
        request: &TokenRequest,
    ) -> AuthResult<(Principal, Option<String>)> {
        let username = required(request.username.as_deref(), "username")?;
        let password = required(request.password.as_deref(), "password")?;

        let user = self
            .model
            .get_user(username, password)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("user credentials are invalid"))?;

        Ok((Principal::User { id: user.id }, request.scope.clone()))
    }

    async fn client_credentials_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> AuthResult<(Principal, Option<String>)> {
        let principal = self.model.get_user_from_client(client).await?;
        Ok((Principal::Client(principal), request.scope.clone()))
    }

    async fn refresh_token_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> AuthResult<(Principal, Option<String>)> {
        let value = required(request.refresh_token.as_deref(), "refresh_token")?;

        let token = self
            .model
            .get_refresh_token(value)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("refresh token is invalid"))?;

        if token.client.id != client.id {
            return Err(AuthError::invalid_grant(
                "refresh token was issued to another client",
            ));
        }
        if token.is_expired() {
            return Err(AuthError::invalid_grant("refresh token has expired"));
        }

        let scope = match request.scope.as_deref() {
            Some(requested) if !scope_covers(token.scope.as_deref(), requested) => {
                return Err(AuthError::invalid_scope(
                    "requested scope exceeds the original grant",
                ));
            }
            Some(requested) => Some(requested.to_string()),
            None => token.scope.clone(),
        };

        let principal = match token.user.id {
            Some(id) => Principal::User { id },
            None => return Err(AuthError::invalid_grant("refresh token has no user")),
        };

        Ok((principal, scope))
    }

    /// Deletes the refresh token a new pair was just issued against.
    ///
    /// If a concurrent refresh consumed it first, the new pair is withdrawn.
    async fn consume_refresh_token(
        &self,
        request: &TokenRequest,
        issued: &IssuedToken,
    ) -> AuthResult<()> {
        let value = required(request.refresh_token.as_deref(), "refresh_token")?;
        if self.model.revoke_token(value).await? {
            return Ok(());
        }

        if let Some(replacement) = issued.refresh_token.as_deref() {
            self.model.revoke_token(replacement).await?;
        }
        tracing::warn!("Refresh token consumed concurrently, replacement withdrawn");
        Err(AuthError::invalid_grant("refresh token is invalid"))
    }

    async fn persist(
        &self,
        client: &Client,
        principal: &Principal,
        scope: Option<String>,
        with_refresh: bool,
    ) -> AuthResult<IssuedToken> {
        let mut attempt = 0;
        loop {
            let token = self.generate(scope.clone(), with_refresh)?;
            match self.model.save_token(&token, client, principal).await {
                Ok(_) => return Ok(token),
                Err(e) if e.is_conflict() && attempt < self.config.token_collision_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, client_id = %client.id, "Token value collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn generate(&self, scope: Option<String>, with_refresh: bool) -> AuthResult<IssuedToken> {
        let now = OffsetDateTime::now_utc();
        let access_token_expires_at = expiry(now, self.config.access_token_lifetime)?;
        let refresh_token_expires_at = if with_refresh {
            Some(expiry(now, self.config.refresh_token_lifetime)?)
        } else {
            None
        };

        Ok(IssuedToken {
            access_token: generate_token(),
            access_token_expires_at,
            refresh_token: with_refresh.then(generate_token),
            refresh_token_expires_at,
            scope,
        })
    }

    async fn resolve_bearer(
        &self,
        bearer: &str,
        options: &AuthenticateOptions,
    ) -> AuthResult<AuthContext> {
        let bearer = bearer.trim();
        let value = bearer.strip_prefix("Bearer ").unwrap_or(bearer).trim();
        if value.is_empty() {
            return Err(AuthError::unauthorized("Missing bearer token"));
        }

        let token = self
            .model
            .get_access_token(value)
            .await?
            .ok_or_else(|| AuthError::invalid_token("access token is invalid"))?;

        if token.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        if let Some(required) = options.scope.as_deref() {
            if !token.has_scope(required) {
                return Err(AuthError::insufficient_scope(format!(
                    "token lacks `{required}`"
                )));
            }
        }

        let issued_to_client = self
            .model
            .get_client(&token.client_id, None)
            .await?
            .is_some_and(|client| {
                client.is_grant_type_allowed(GrantType::ClientCredentials)
                    && !client.is_grant_type_allowed(GrantType::Password)
            });

        Ok(AuthContext::from_access_token(
            &token,
            self.config.client_credentials_user_id,
            issued_to_client,
        ))
    }
}

#[async_trait]
impl Authenticator for GrantEngine {
    async fn authenticate(
        &self,
        bearer: &str,
        options: &AuthenticateOptions,
    ) -> AuthResult<AuthContext> {
        match self.resolve_bearer(bearer, options).await {
            Ok(ctx) => Ok(ctx),
            Err(e) if options.continue_on_failure && e.is_client_error() => {
                tracing::debug!(error = %e, "Continuing unauthenticated");
                Ok(AuthContext::unauthenticated())
            }
            Err(e) => {
                tracing::debug!(error = %e, category = %e.category(), "Authentication failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for GrantEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> AuthResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::invalid_request(format!("Missing parameter: `{name}`")))
}

fn expiry(now: OffsetDateTime, lifetime: std::time::Duration) -> AuthResult<OffsetDateTime> {
    time::Duration::try_from(lifetime)
        .ok()
        .and_then(|lifetime| now.checked_add(lifetime))
        .ok_or_else(|| AuthError::configuration("token lifetime out of range"))
}

fn scope_covers(granted: Option<&str>, requested: &str) -> bool {
    let granted: Vec<&str> = granted.map(|s| s.split_whitespace().collect()).unwrap_or_default();
    requested.split_whitespace().all(|s| granted.contains(&s))
}

// =============================================================================
// Test double
// =============================================================================

/// Authenticator that accepts any bearer and returns a fixed context.
///
/// Only compiled for tests and under the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    context: AuthContext,
}

#[cfg(any(test, feature = "test-util"))]
impl StaticAuthenticator {
    /// Authenticates every request as the given user.
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self {
            context: AuthContext::for_user(user_id),
        }
    }

    /// Authenticates every request with the given context.
    #[must_use]
    pub fn with_context(context: AuthContext) -> Self {
        Self { context }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Default for StaticAuthenticator {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        _bearer: &str,
        _options: &AuthenticateOptions,
    ) -> AuthResult<AuthContext> {
        Ok(self.context.clone())
    }
}

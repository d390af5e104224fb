//! OAuth 2.0 configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [oauth]
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "14d"
//! client_credentials_user_id = 1
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder user id stored for client-credential tokens by default.
pub const DEFAULT_CLIENT_CREDENTIALS_USER_ID: i64 = 1;

/// Token issuance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// User id recorded on client-credential tokens.
    /// `None` stores the token without a user.
    pub client_credentials_user_id: Option<i64>,

    /// How many times token generation is retried after a value collision.
    pub token_collision_retries: u32,

    /// Issue a refresh token on the password grant even when the client
    /// lacks the `refresh_token` grant.
    pub always_issue_refresh_token: bool,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600), // 1 hour
            refresh_token_lifetime: Duration::from_secs(14 * 24 * 3600), // 2 weeks
            client_credentials_user_id: Some(DEFAULT_CLIENT_CREDENTIALS_USER_ID),
            token_collision_retries: 3,
            always_issue_refresh_token: false,
        }
    }
}

impl OAuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a lifetime is zero or exceeds the representable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_lifetime.is_zero() {
            return Err(ConfigError::invalid(
                "oauth.access_token_lifetime",
                "must be greater than zero",
            ));
        }
        if self.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::invalid(
                "oauth.refresh_token_lifetime",
                "must be greater than zero",
            ));
        }
        check_expiry_representable("oauth.access_token_lifetime", self.access_token_lifetime)?;
        check_expiry_representable("oauth.refresh_token_lifetime", self.refresh_token_lifetime)?;
        Ok(())
    }
}

/// Rejects lifetimes whose expiry, counted from now, is not a valid timestamp.
fn check_expiry_representable(field: &str, lifetime: Duration) -> Result<(), ConfigError> {
    time::Duration::try_from(lifetime)
        .ok()
        .and_then(|lifetime| time::OffsetDateTime::now_utc().checked_add(lifetime))
        .map(|_| ())
        .ok_or_else(|| ConfigError::invalid(field, "is out of range"))
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid configuration for {field}: {message}")]
pub struct ConfigError {
    /// Dotted path of the offending setting.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a new validation error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

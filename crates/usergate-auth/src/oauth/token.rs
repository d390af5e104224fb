//! Token endpoint types.
//!
//! # Supported Grant Types
//!
//! - `password` - Resource owner credentials
//! - `client_credentials` - Machine-to-machine authentication
//! - `refresh_token` - Exchange a refresh token for a new token pair

use serde::{Deserialize, Serialize};

/// Token request parameters.
///
/// Different fields are required depending on the `grant_type`:
///
/// - `password`: username, password
/// - `client_credentials`: (optional) scope
/// - `refresh_token`: refresh_token, (optional) scope
///
/// Every grant requires `client_id` and `client_secret`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type.
    pub grant_type: String,

    /// Client ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Username (password grant).
    #[serde(default)]
    pub username: Option<String>,

    /// Password (password grant).
    #[serde(default)]
    pub password: Option<String>,

    /// Refresh token (refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Requested scope (space-separated).
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Builds a password grant request.
    #[must_use]
    pub fn password(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "password".to_string(),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Builds a client_credentials grant request.
    #[must_use]
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "client_credentials".to_string(),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Builds a refresh_token grant request.
    #[must_use]
    pub fn refresh(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "refresh_token".to_string(),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            refresh_token: Some(refresh_token.into()),
            ..Self::default()
        }
    }

    /// Sets the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Successful token response.
///
/// ```json
/// {
///   "access_token": "q1b8...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "refresh_token": "Zx0c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Refresh token, if one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Creates a new bearer token response.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            scope: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: Option<String>) -> Self {
        self.refresh_token = token;
        self
    }

    /// Sets the granted scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_form_fields() {
        let request: TokenRequest = serde_json::from_value(serde_json::json!({
            "grant_type": "password",
            "client_id": "app",
            "client_secret": "s3cret",
            "username": "alice",
            "password": "pw"
        }))
        .unwrap();

        assert_eq!(request.grant_type, "password");
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert!(request.refresh_token.is_none());
    }

    #[test]
    fn test_response_serialization() {
        let response = TokenResponse::new("abc".to_string(), 3600);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 3600);
        assert!(json.get("refresh_token").is_none());

        let response = response.with_refresh_token(Some("def".to_string()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refresh_token"], "def");
    }
}

//! Principals a token can be issued to, and the resolved identity of a
//! bearer token.

use serde::{Deserialize, Serialize};

use super::client::GrantType;
use super::token::AccessToken;

/// Synthetic user identity for a client acting on its own behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPrincipal {
    /// Equal to the client id.
    pub id: String,
    /// The client id as stored.
    pub client_id: String,
    /// Grants of the client.
    pub grants: Vec<GrantType>,
}

/// The identity a token is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A resource owner authenticated by username and password.
    User {
        /// Numeric user id.
        id: i64,
    },
    /// A client authenticated through the client_credentials grant.
    Client(ClientPrincipal),
}

impl Principal {
    /// Returns the numeric user id, if this principal has one.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::User { id } => Some(*id),
            Self::Client(_) => None,
        }
    }
}

/// Identity resolved from a bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Resolved user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// `true` when the principal is the client itself rather than a user.
    #[serde(default)]
    pub client_credential: bool,
    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// `true` when authentication failed and the caller opted to continue.
    #[serde(default)]
    pub unauthenticated: bool,
}

impl AuthContext {
    /// Context for a request whose token could not be validated.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            unauthenticated: true,
            ..Self::default()
        }
    }

    /// Context for a fixed user principal.
    #[must_use]
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Resolves the principal carried by a stored access token.
    ///
    /// `client_credentials_user_id` is the placeholder user id stored for
    /// client-credential tokens; a token attributed to it, or to no user at
    /// all, resolves to the client itself when `issued_to_client` holds.
    #[must_use]
    pub fn from_access_token(
        token: &AccessToken,
        client_credentials_user_id: Option<i64>,
        issued_to_client: bool,
    ) -> Self {
        let client_credential =
            issued_to_client && token.user_id == client_credentials_user_id;

        Self {
            user_id: if client_credential {
                None
            } else {
                token.user_id
            },
            client_id: Some(token.client_id.clone()),
            client_credential,
            scope: token.scope.clone(),
            unauthenticated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(user_id: Option<i64>) -> AccessToken {
        AccessToken {
            access_token: "at".to_string(),
            access_token_expires_at: None,
            client_id: "machine".to_string(),
            user_id,
            scope: None,
        }
    }

    #[test]
    fn test_principal_user_id() {
        assert_eq!(Principal::User { id: 4 }.user_id(), Some(4));
        let client = Principal::Client(ClientPrincipal {
            id: "machine".to_string(),
            client_id: "machine".to_string(),
            grants: vec![GrantType::ClientCredentials],
        });
        assert_eq!(client.user_id(), None);
    }

    #[test]
    fn test_user_token_resolves_to_user() {
        let ctx = AuthContext::from_access_token(&make_token(Some(9)), Some(1), false);
        assert_eq!(ctx.user_id, Some(9));
        assert_eq!(ctx.client_id.as_deref(), Some("machine"));
        assert!(!ctx.client_credential);
    }

    #[test]
    fn test_client_token_resolves_to_client() {
        let ctx = AuthContext::from_access_token(&make_token(Some(1)), Some(1), true);
        assert!(ctx.client_credential);
        assert_eq!(ctx.user_id, None);

        let ctx = AuthContext::from_access_token(&make_token(None), None, true);
        assert!(ctx.client_credential);
    }

    #[test]
    fn test_unauthenticated_context() {
        let ctx = AuthContext::unauthenticated();
        assert!(ctx.unauthenticated);
        assert_eq!(ctx.user_id, None);
    }
}

//! Token domain types.
//!
//! One stored row exists per issued access token. Expiry timestamps are
//! persisted as Unix seconds. Revocation deletes the row.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// Stored rows
// =============================================================================

/// Token row to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    /// Access token value.
    pub access_token: String,
    /// Access token expiry in Unix seconds.
    pub access_token_expires_at: i64,
    /// Refresh token value, if one was issued.
    pub refresh_token: Option<String>,
    /// Refresh token expiry in Unix seconds.
    pub refresh_token_expires_at: Option<i64>,
    /// Owning user; `None` stores a NULL user.
    pub user_id: Option<i64>,
    /// Owning client.
    pub client_id: String,
    /// Granted scope.
    pub scope: Option<String>,
}

/// Token row as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    /// Row id.
    pub id: i64,
    /// Access token value.
    pub access_token: String,
    /// Access token expiry in Unix seconds.
    pub access_token_expires_at: Option<i64>,
    /// Refresh token value.
    pub refresh_token: Option<String>,
    /// Refresh token expiry in Unix seconds.
    pub refresh_token_expires_at: Option<i64>,
    /// Owning user.
    pub user_id: Option<i64>,
    /// Owning client.
    pub client_id: String,
    /// Granted scope.
    pub scope: Option<String>,
}

// =============================================================================
// Engine-facing shapes
// =============================================================================

/// Token generated by the grant engine, prior to persistence.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Access token value.
    pub access_token: String,
    /// Access token expiry.
    pub access_token_expires_at: OffsetDateTime,
    /// Refresh token value.
    pub refresh_token: Option<String>,
    /// Refresh token expiry.
    pub refresh_token_expires_at: Option<OffsetDateTime>,
    /// Granted scope.
    pub scope: Option<String>,
}

/// Reference to a client by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    /// The OAuth client_id.
    pub id: String,
}

/// Reference to a user by id. The id is absent for tokens without a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Numeric user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Result of an access token lookup. Absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Access token value.
    pub access_token: String,
    /// Access token expiry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub access_token_expires_at: Option<OffsetDateTime>,
    /// Owning client.
    pub client_id: String,
    /// Owning user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AccessToken {
    /// Returns `true` if the token has an expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.access_token_expires_at
            .is_some_and(|exp| OffsetDateTime::now_utc() > exp)
    }

    /// Returns `true` if every space-separated scope in `required` was granted.
    #[must_use]
    pub fn has_scope(&self, required: &str) -> bool {
        let granted: Vec<&str> = self
            .scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default();
        required.split_whitespace().all(|s| granted.contains(&s))
    }
}

impl From<StoredToken> for AccessToken {
    fn from(row: StoredToken) -> Self {
        Self {
            access_token: row.access_token,
            access_token_expires_at: row
                .access_token_expires_at
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
            client_id: row.client_id,
            user_id: row.user_id,
            scope: row.scope,
        }
    }
}

/// Result of a refresh token lookup, in the nested `client`/`user` shape.
///
/// Expiry is not checked here; the grant engine validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Refresh token value.
    pub refresh_token: String,
    /// Refresh token expiry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub refresh_token_expires_at: Option<OffsetDateTime>,
    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Owning client.
    pub client: ClientRef,
    /// Owning user.
    pub user: UserRef,
}

impl RefreshToken {
    /// Returns `true` if the token has an expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.refresh_token_expires_at
            .is_some_and(|exp| OffsetDateTime::now_utc() > exp)
    }

    /// Builds the lookup shape from a stored row that carries a refresh token.
    #[must_use]
    pub fn from_stored(row: StoredToken) -> Option<Self> {
        let refresh_token = row.refresh_token?;
        Some(Self {
            refresh_token,
            refresh_token_expires_at: row
                .refresh_token_expires_at
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
            scope: row.scope,
            client: ClientRef { id: row.client_id },
            user: UserRef { id: row.user_id },
        })
    }
}

/// Result of persisting a token, re-read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedToken {
    /// Access token value.
    pub access_token: String,
    /// Refresh token value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Owning client.
    pub client: ClientRef,
    /// Owning user.
    pub user: UserRef,
}

impl From<StoredToken> for SavedToken {
    fn from(row: StoredToken) -> Self {
        Self {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            client: ClientRef { id: row.client_id },
            user: UserRef { id: row.user_id },
        }
    }
}

/// Generate a cryptographically secure random token.
///
/// Returns a 256-bit random value encoded as base64url (43 characters).
#[must_use]
pub fn generate_token() -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_row() -> StoredToken {
        StoredToken {
            id: 1,
            access_token: "at".to_string(),
            access_token_expires_at: Some(1_704_067_200),
            refresh_token: Some("rt".to_string()),
            refresh_token_expires_at: Some(1_704_153_600),
            user_id: Some(3),
            client_id: "client".to_string(),
            scope: Some("read write".to_string()),
        }
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_access_token_from_row() {
        let token = AccessToken::from(make_row());
        assert_eq!(token.client_id, "client");
        assert_eq!(token.user_id, Some(3));
        assert_eq!(
            token.access_token_expires_at.map(OffsetDateTime::unix_timestamp),
            Some(1_704_067_200)
        );
        assert!(token.is_expired());
    }

    #[test]
    fn test_access_token_omits_absent_fields() {
        let mut row = make_row();
        row.user_id = None;
        row.scope = None;
        let json = serde_json::to_value(AccessToken::from(row)).unwrap();
        assert!(json.get("userId").is_none());
        assert!(json.get("scope").is_none());
        assert_eq!(json["clientId"], "client");
    }

    #[test]
    fn test_access_token_scope() {
        let token = AccessToken::from(make_row());
        assert!(token.has_scope("read"));
        assert!(token.has_scope("write read"));
        assert!(token.has_scope(""));
        assert!(!token.has_scope("admin"));
    }

    #[test]
    fn test_refresh_token_nested_shape() {
        let token = RefreshToken::from_stored(make_row()).unwrap();
        assert_eq!(token.client, ClientRef { id: "client".to_string() });
        assert_eq!(token.user, UserRef { id: Some(3) });
        assert!(token.is_expired());
    }

    #[test]
    fn test_refresh_token_requires_value() {
        let mut row = make_row();
        row.refresh_token = None;
        assert!(RefreshToken::from_stored(row).is_none());
    }

    #[test]
    fn test_refresh_token_not_expired() {
        let mut token = RefreshToken::from_stored(make_row()).unwrap();
        token.refresh_token_expires_at = Some(OffsetDateTime::now_utc() + Duration::hours(1));
        assert!(!token.is_expired());
        token.refresh_token_expires_at = None;
        assert!(!token.is_expired());
    }
}

//! OAuth 2.0 client domain types.
//!
//! Clients are immutable reference data seeded at deploy time. Redirect URIs
//! and grants are stored as comma/space-delimited strings and split on read.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types a client may be allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Resource Owner Password Credentials flow.
    Password,
    /// Client Credentials flow. The client acts on its own behalf.
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = UnknownGrantType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "client_credentials" => Ok(Self::ClientCredentials),
            "refresh_token" => Ok(Self::RefreshToken),
            other => Err(UnknownGrantType(other.to_string())),
        }
    }
}

/// A grant name that does not correspond to a supported [`GrantType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown grant type: {0}")]
pub struct UnknownGrantType(pub String);

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 client as seen by the grant engine.
///
/// The secret is never carried here; it is only used as a lookup predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// The OAuth client_id.
    pub id: String,

    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Grant types this client may use.
    pub grants: Vec<GrantType>,
}

impl Client {
    /// Builds a client from its stored, delimited representation.
    ///
    /// Unknown grant names are dropped with a warning.
    #[must_use]
    pub fn from_stored(client_id: impl Into<String>, redirect_uri: &str, grants: &str) -> Self {
        let id = client_id.into();
        let grants = split_delimited(grants)
            .into_iter()
            .filter_map(|name| match name.parse::<GrantType>() {
                Ok(grant) => Some(grant),
                Err(e) => {
                    tracing::warn!(client_id = %id, error = %e, "Ignoring stored grant");
                    None
                }
            })
            .collect();

        Self {
            redirect_uris: split_delimited(redirect_uri),
            grants,
            id,
        }
    }

    /// Checks if the given grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grants.contains(&grant_type)
    }

    /// Checks if the given redirect URI is registered for this client.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }
}

/// Splits a comma and/or space delimited string, dropping empty segments.
#[must_use]
pub fn split_delimited(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Joins grants into their stored, comma-delimited form.
#[must_use]
pub fn join_grants(grants: &[GrantType]) -> String {
    grants
        .iter()
        .map(GrantType::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_delimited_mixed_separators() {
        assert_eq!(
            split_delimited("password, refresh_token  client_credentials,"),
            vec!["password", "refresh_token", "client_credentials"]
        );
        assert!(split_delimited("").is_empty());
        assert!(split_delimited(" , ").is_empty());
    }

    #[test]
    fn test_from_stored() {
        let client = Client::from_stored(
            "b921b25ebe3ee70c6b1",
            "https://app.example.com/cb https://app.example.com/alt",
            "password,refresh_token",
        );

        assert_eq!(client.id, "b921b25ebe3ee70c6b1");
        assert_eq!(
            client.grants,
            vec![GrantType::Password, GrantType::RefreshToken]
        );
        assert!(client.is_redirect_uri_allowed("https://app.example.com/alt"));
        assert!(!client.is_redirect_uri_allowed("https://evil.example.com"));
    }

    #[test]
    fn test_from_stored_drops_unknown_grants() {
        let client = Client::from_stored("c", "", "implicit client_credentials");
        assert_eq!(client.grants, vec![GrantType::ClientCredentials]);
        assert!(client.redirect_uris.is_empty());
    }

    #[test]
    fn test_grant_type_parse() {
        assert_eq!(
            "client_credentials".parse::<GrantType>(),
            Ok(GrantType::ClientCredentials)
        );
        assert_eq!(
            "authorization_code".parse::<GrantType>(),
            Err(UnknownGrantType("authorization_code".to_string()))
        );
    }

    #[test]
    fn test_grant_type_allowed() {
        let client = Client::from_stored("c", "", "client_credentials");
        assert!(client.is_grant_type_allowed(GrantType::ClientCredentials));
        assert!(!client.is_grant_type_allowed(GrantType::Password));
    }

    #[test]
    fn test_join_grants() {
        assert_eq!(
            join_grants(&[GrantType::Password, GrantType::RefreshToken]),
            "password,refresh_token"
        );
    }

    #[test]
    fn test_serde_shape() {
        let client = Client::from_stored("c", "", "password");
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "c", "redirectUris": [], "grants": ["password"]})
        );
    }
}

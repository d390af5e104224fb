//! User domain types.
//!
//! Users are read-only from the auth core's perspective. Passwords only ever
//! exist here as SHA-256 hex digests; [`UserQuery::with_password`] hashes the
//! plaintext before it can reach a storage backend.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum number of users a single `find` returns.
pub const USER_FIND_LIMIT: i64 = 50;

// =============================================================================
// Password Hash
// =============================================================================

/// SHA-256 hex digest of a user password.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes a plaintext password.
    #[must_use]
    pub fn from_plaintext(password: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(**redacted**)")
    }
}

// =============================================================================
// User
// =============================================================================

/// Full user row as stored.
#[derive(Debug, Clone)]
pub struct User {
    /// Numeric user id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique login name.
    pub username: String,
    /// SHA-256 hex digest of the password.
    pub password_hash: PasswordHash,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last update time, if the row was ever updated.
    pub updated_at: Option<OffsetDateTime>,
}

/// User as returned to callers: no secrets, timestamps as Unix seconds.
///
/// The listing projection only carries `id`, `name`, and `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Numeric user id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique login name.
    pub username: String,
    /// Creation time in Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Last update time in Unix seconds; falls back to `created_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl UserRecord {
    /// Builds a record from the cheap `{id, name, username}` projection.
    #[must_use]
    pub fn listing(id: i64, name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            username: username.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Builds a full record, converting timestamps to Unix seconds.
    ///
    /// A missing `updated_at` falls back to `created_at`.
    #[must_use]
    pub fn detail(
        id: i64,
        name: impl Into<String>,
        username: impl Into<String>,
        created_at: OffsetDateTime,
        updated_at: Option<OffsetDateTime>,
    ) -> Self {
        let created_at = created_at.unix_timestamp();
        let updated_at = updated_at.map_or(created_at, OffsetDateTime::unix_timestamp);

        Self {
            id,
            name: name.into(),
            username: username.into(),
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self::detail(
            user.id,
            user.name,
            user.username,
            user.created_at,
            user.updated_at,
        )
    }
}

// =============================================================================
// User Query
// =============================================================================

/// Allow-listed filter for user lookups.
///
/// Only `id`, `username`, and the password digest can be filtered on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Match on user id. When absent, lookups use the listing projection.
    pub id: Option<i64>,
    /// Match on username.
    pub username: Option<String>,
    /// Match on password digest.
    pub password: Option<PasswordHash>,
}

impl UserQuery {
    /// Creates an empty query matching every user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to one user id.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Restricts the query to one username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Restricts the query to users whose password hashes to the same digest.
    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(PasswordHash::from_plaintext(password));
        self
    }

    /// Returns `true` when only the `{id, name, username}` columns are projected.
    #[must_use]
    pub fn is_listing(&self) -> bool {
        self.id.is_none()
    }

    /// Returns `true` if the given user satisfies every predicate.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        self.id.is_none_or(|id| user.id == id)
            && self
                .username
                .as_ref()
                .is_none_or(|username| &user.username == username)
            && self
                .password
                .as_ref()
                .is_none_or(|password| &user.password_hash == password)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn make_user() -> User {
        User {
            id: 7,
            name: "Ada".to_string(),
            username: "ada".to_string(),
            password_hash: PasswordHash::from_plaintext("secret"),
            created_at: datetime!(2024-01-01 00:00:00 UTC),
            updated_at: None,
        }
    }

    #[test]
    fn test_password_hash_is_sha256_hex() {
        let hash = PasswordHash::from_plaintext("secret");
        assert_eq!(
            hash.as_str(),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
        assert_ne!(hash, PasswordHash::from_plaintext("Secret"));
    }

    #[test]
    fn test_password_hash_debug_is_redacted() {
        let hash = PasswordHash::from_plaintext("secret");
        assert!(!format!("{hash:?}").contains(hash.as_str()));
    }

    #[test]
    fn test_record_updated_at_falls_back_to_created_at() {
        let record = UserRecord::from(make_user());
        assert_eq!(record.created_at, Some(1_704_067_200));
        assert_eq!(record.updated_at, Some(1_704_067_200));
    }

    #[test]
    fn test_record_keeps_updated_at() {
        let mut user = make_user();
        user.updated_at = Some(datetime!(2024-01-02 00:00:00 UTC));
        let record = UserRecord::from(user);
        assert_eq!(record.updated_at, Some(1_704_153_600));
    }

    #[test]
    fn test_record_never_serializes_password() {
        let json = serde_json::to_value(UserRecord::from(make_user())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["createdAt"], 1_704_067_200);
    }

    #[test]
    fn test_listing_projection_omits_timestamps() {
        let json = serde_json::to_value(UserRecord::listing(1, "Ada", "ada")).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "name": "Ada", "username": "ada"}));
    }

    #[test]
    fn test_query_hashes_password() {
        let query = UserQuery::new().with_username("ada").with_password("secret");
        assert_eq!(query.password, Some(PasswordHash::from_plaintext("secret")));
        assert!(query.is_listing());
        assert!(!UserQuery::new().with_id(1).is_listing());
    }

    #[test]
    fn test_query_matches() {
        let user = make_user();
        assert!(UserQuery::new().matches(&user));
        assert!(UserQuery::new().with_username("ada").with_password("secret").matches(&user));
        assert!(!UserQuery::new().with_password("wrong").matches(&user));
        assert!(!UserQuery::new().with_id(8).matches(&user));
    }
}

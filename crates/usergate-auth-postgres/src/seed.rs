//! Reference data seeding.
//!
//! Seed clients come from configuration; their secrets are deployment
//! secrets and are never compiled in.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use usergate_auth::ConfigError;
use usergate_auth::types::GrantType;

use crate::client::ClientStorage;
use crate::{PgPool, StorageResult};

/// A client to insert on first run.
///
/// # Example (TOML)
///
/// ```toml
/// [[seed.clients]]
/// client_id = "b921b25ebe3ee70c6b1"
/// client_secret = "change-me"
/// grants = ["password", "refresh_token"]
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedClient {
    /// OAuth client_id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Grants the client may use.
    #[serde(default)]
    pub grants: Vec<GrantType>,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl SeedClient {
    /// Validates the seed entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or secret is blank or no grant is listed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::invalid("seed.clients.client_id", "must not be empty"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::invalid(
                "seed.clients.client_secret",
                format!("must not be empty for client {}", self.client_id),
            ));
        }
        if self.grants.is_empty() {
            return Err(ConfigError::invalid(
                "seed.clients.grants",
                format!("client {} has no grants", self.client_id),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"**redacted**")
            .field("grants", &self.grants)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

/// Inserts each client unless it already exists.
///
/// Returns the number of clients inserted.
///
/// # Errors
///
/// Returns an error if an insert fails.
#[instrument(skip_all, fields(count = clients.len()))]
pub async fn seed_clients(pool: &PgPool, clients: &[SeedClient]) -> StorageResult<u64> {
    let storage = ClientStorage::new(pool);
    let mut inserted = 0;

    for client in clients {
        let created = storage
            .insert_if_absent(
                &client.client_id,
                &client.client_secret,
                &client.redirect_uris,
                &client.grants,
            )
            .await?;
        if created {
            inserted += 1;
        }
        info!(client_id = %client.client_id, created, "Seed client");
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_seed() -> SeedClient {
        SeedClient {
            client_id: "b921b25ebe3ee70c6b2".to_string(),
            client_secret: "machine-secret".to_string(),
            grants: vec![GrantType::ClientCredentials],
            redirect_uris: vec![],
        }
    }

    #[test]
    fn test_validate() {
        assert!(make_seed().validate().is_ok());

        let mut seed = make_seed();
        seed.client_secret = "  ".to_string();
        assert_eq!(
            seed.validate().unwrap_err().field,
            "seed.clients.client_secret"
        );

        let mut seed = make_seed();
        seed.grants.clear();
        assert!(seed.validate().is_err());
    }

    #[test]
    fn test_unknown_grant_rejected() {
        let result: Result<SeedClient, _> = serde_json::from_value(serde_json::json!({
            "client_id": "app",
            "client_secret": "s",
            "grants": ["implicit"]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", make_seed());
        assert!(!rendered.contains("machine-secret"));
        assert!(rendered.contains("b921b25ebe3ee70c6b2"));
    }
}

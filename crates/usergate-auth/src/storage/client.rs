//! Client storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read-only storage operations for OAuth 2.0 clients.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Find a client by client_id and, when given, client secret.
    ///
    /// Returns `None` if no client matches both predicates.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, client_id: &str, client_secret: Option<&str>)
    -> AuthResult<Option<Client>>;

    /// Find a client by its OAuth client_id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        self.find(client_id, None).await
    }
}

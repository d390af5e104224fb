//! OAuth 2.0 token issuance and validation.
//!
//! - [`model`] - The seven callbacks the grant engine needs from storage
//! - [`token`] - Token endpoint request/response types
//! - [`engine`] - Grant engine and bearer authentication
//!
//! # Example
//!
//! ```ignore
//! use usergate_auth::oauth::{GrantEngine, TokenModel, TokenRequest};
//!
//! let model = TokenModel::new(users, clients, tokens, config.client_credentials_user_id);
//! let engine = GrantEngine::new(Arc::new(model), config);
//!
//! let response = engine.issue_token(&TokenRequest::password("app", "secret", "alice", "pw")).await?;
//! let ctx = engine.authenticate(&response.access_token, &AuthenticateOptions::default()).await?;
//! ```

pub mod engine;
pub mod model;
pub mod token;

pub use engine::{AuthenticateOptions, Authenticator, GrantEngine};
#[cfg(any(test, feature = "test-util"))]
pub use engine::StaticAuthenticator;
pub use model::{OAuth2Model, TokenModel};
pub use token::{TokenRequest, TokenResponse};

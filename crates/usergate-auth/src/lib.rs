//! # usergate-auth
//!
//! OAuth 2.0 token model and grant engine for the usergate user backend.
//!
//! This crate provides:
//! - The seven-operation token model consumed by the grant engine
//! - A grant engine for the password, client_credentials, and refresh_token grants
//! - Bearer token authentication with optional scope checks
//! - Storage traits for users, clients, and tokens
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes and issuance settings
//! - [`oauth`] - Token model and grant engine
//! - [`storage`] - Storage traits for auth-related data
//! - [`types`] - Domain types shared by the model and the storage backends
//!
//! Storage backends live in separate crates (`usergate-auth-postgres`).

pub mod config;
pub mod error;
pub mod oauth;
pub mod storage;
pub mod types;

pub use config::{ConfigError, OAuthConfig};
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    AuthenticateOptions, Authenticator, GrantEngine, OAuth2Model, TokenModel, TokenRequest,
    TokenResponse,
};
pub use storage::{ClientStorage, TokenStorage, UserStorage};
pub use types::{
    AccessToken, AuthContext, Client, ClientPrincipal, GrantType, Principal, RefreshToken,
    SavedToken, UserQuery, UserRecord,
};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use usergate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::OAuthConfig;
    pub use crate::error::AuthError;
    pub use crate::oauth::{AuthenticateOptions, Authenticator, GrantEngine, OAuth2Model};
    pub use crate::storage::{ClientStorage, TokenStorage, UserStorage};
    pub use crate::types::{AuthContext, Client, GrantType, Principal};
    pub use crate::AuthResult;
}

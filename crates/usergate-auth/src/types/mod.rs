//! Common types used across the auth modules.
//!
//! ## Domain Types
//!
//! - [`User`] / [`UserRecord`] - Resource owners and their public shape
//! - [`Client`] / [`GrantType`] - OAuth 2.0 client reference data
//! - [`AccessToken`] / [`RefreshToken`] - Token lookup results
//! - [`Principal`] / [`AuthContext`] - Who a token is issued to, and who presented it

pub mod client;
pub mod principal;
pub mod token;
pub mod user;

pub use client::{Client, GrantType, UnknownGrantType, join_grants, split_delimited};
pub use principal::{AuthContext, ClientPrincipal, Principal};
pub use token::{
    AccessToken, ClientRef, IssuedToken, NewToken, RefreshToken, SavedToken, StoredToken, UserRef,
    generate_token,
};
pub use user::{PasswordHash, USER_FIND_LIMIT, User, UserQuery, UserRecord};

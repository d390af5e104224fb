//! Storage traits for authentication data.
//!
//! This module defines storage interfaces for:
//!
//! - Users (read-only lookups)
//! - OAuth client registrations (read-only lookups)
//! - Access and refresh tokens (create, read, delete)
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `usergate-auth-postgres` - PostgreSQL storage backend
//!
//! In-memory implementations for tests live in [`memory`] behind the
//! `test-util` feature.

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod token;
pub mod user;

pub use client::ClientStorage;
pub use token::TokenStorage;
pub use user::UserStorage;

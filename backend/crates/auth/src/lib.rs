//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, token codec, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database, revocation registry and Google implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration and OAuth2 password-flow login with email + password
//! - Access/refresh JWT pair with single-use refresh rotation
//! - Google login (authorization code + PKCE)
//! - Admin user management
//!
//! ## Security Model
//! - Passwords hashed with Argon2id on the blocking pool
//! - Access and refresh tokens signed with distinct HS256 secrets
//! - Refresh tokens consumed atomically before a new pair is issued
//! - Uniform login failure message

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, GoogleOAuthConfig};
pub use error::{AuthError, AuthResult};
pub use infra::google::GoogleOAuthClient;
pub use infra::memory::{MemoryRevocationStore, RevocationBackend};
pub use infra::postgres::{PgAuthRepository, PgRevocationStore};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::user::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

//! Repository Traits
//!
//! Interfaces for data persistence and the identity provider.
//! Implementations are in the infrastructure layer.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::AuthResult;

/// One page of a user listing
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total_count: i64,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; a duplicate email yields `AuthError::EmailTaken`
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Persist all mutable fields
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Hard delete; returns whether a row was removed
    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;

    /// Newest first; `search` matches email or name case-insensitively
    async fn list(&self, search: Option<&str>, offset: i64, limit: i64) -> AuthResult<UserPage>;
}

/// Registry of consumed refresh-token identifiers
#[trait_variant::make(RevocationStore: Send)]
pub trait LocalRevocationStore {
    /// Atomically mark `jti` as consumed by `claim`
    ///
    /// Returns `true` iff the entry for `jti` belongs to `claim`, whether this
    /// call or an earlier attempt with the same `claim` inserted it. Two
    /// different claims on one `jti` never both return `true`.
    async fn try_revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
        claim: Uuid,
    ) -> AuthResult<bool>;

    /// Mark `jti` as used; revoking twice is a no-op
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()>;

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool>;

    /// Drop entries whose token has expired anyway
    async fn purge_expired(&self) -> AuthResult<u64>;
}

/// Identity asserted by an external provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub email: String,
    pub name: Option<String>,
}

/// OAuth 2.0 authorization-code provider
#[trait_variant::make(OAuthProvider: Send)]
pub trait LocalOAuthProvider {
    /// Provider consent URL carrying `state` and the PKCE challenge
    fn authorize_url(&self, state: &str, code_challenge: &str) -> AuthResult<String>;

    /// Exchange the authorization code and fetch the user's identity
    async fn fetch_identity(&self, code: &str, code_verifier: &str) -> AuthResult<OAuthIdentity>;
}

//! Refresh Use Case
//!
//! Exchanges a refresh token for a new pair. Each refresh token is redeemable
//! exactly once: its `jti` is consumed before anything is issued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::store::retry_store;
use crate::domain::repository::{RevocationStore, UserRepository};
use crate::domain::token::{TokenCodec, TokenPair, TokenType};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Refresh use case
pub struct RefreshUseCase<U, V>
where
    U: UserRepository,
    V: RevocationStore,
{
    user_repo: Arc<U>,
    revocations: Arc<V>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, V> RefreshUseCase<U, V>
where
    U: UserRepository,
    V: RevocationStore,
{
    pub fn new(
        user_repo: Arc<U>,
        revocations: Arc<V>,
        codec: Arc<TokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            revocations,
            codec,
            config,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.codec.verify(refresh_token, TokenType::Refresh)?;

        if claims.jti.is_empty() || claims.sub.is_empty() {
            return Err(AuthError::InvalidRefreshPayload);
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        // One claim id for every attempt, so a retry after a lost reply
        // recognises the entry its own earlier attempt wrote
        let claim = Uuid::new_v4();
        let revocations = &self.revocations;
        let jti = claims.jti.as_str();
        let newly_revoked = retry_store(self.config.store_retry, move || {
            revocations.try_revoke(jti, expires_at, claim)
        })
        .await?;
        if !newly_revoked {
            tracing::warn!(jti = %claims.jti, "Refresh token reuse rejected");
            return Err(AuthError::RefreshTokenRevoked);
        }

        let user_id =
            UserId::parse_str(&claims.sub).map_err(|_| AuthError::InactiveOrNonexistentUser)?;
        let repo = &self.user_repo;
        let id = &user_id;
        let user = retry_store(self.config.store_retry, move || repo.find_by_id(id)).await?;
        match user {
            Some(user) if user.is_active => {}
            _ => return Err(AuthError::InactiveOrNonexistentUser),
        }

        let pair = self.codec.issue_pair(&claims.sub)?;

        tracing::info!(user_id = %user_id, "Token pair rotated");

        Ok(pair)
    }
}

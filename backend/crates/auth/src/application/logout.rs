//! Logout Use Case
//!
//! Access tokens are stateless and stay valid until expiry. A refresh token
//! handed in at logout is consumed so it can no longer be redeemed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::store::retry_store;
use crate::domain::repository::RevocationStore;
use crate::domain::token::{TokenCodec, TokenType};

/// Logout use case
pub struct LogoutUseCase<V>
where
    V: RevocationStore,
{
    revocations: Arc<V>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<V> LogoutUseCase<V>
where
    V: RevocationStore,
{
    pub fn new(revocations: Arc<V>, codec: Arc<TokenCodec>, config: Arc<AuthConfig>) -> Self {
        Self {
            revocations,
            codec,
            config,
        }
    }

    /// Always succeeds; returns whether a refresh token was revoked
    pub async fn execute(&self, refresh_token: Option<&str>) -> bool {
        let Some(token) = refresh_token else {
            return false;
        };
        let claims = match self.codec.verify(token, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable refresh token at logout");
                return false;
            }
        };

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        let revocations = &self.revocations;
        let jti = claims.jti.as_str();
        match retry_store(self.config.store_retry, move || {
            revocations.revoke(jti, expires_at)
        })
        .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not revoke refresh token at logout");
                false
            }
        }
    }
}

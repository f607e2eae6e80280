//! Current User Use Case
//!
//! Resolves a bearer access token to a loaded user and applies status gates.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::store::retry_store;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::token::{TokenCodec, TokenType};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Current user use case
pub struct CurrentUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U> CurrentUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, codec: Arc<TokenCodec>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            codec,
            config,
        }
    }

    /// Verify `token` as an access token and load its subject
    ///
    /// With `require_active`, an inactive account fails with `UserInactive`.
    pub async fn resolve(&self, token: &str, require_active: bool) -> AuthResult<User> {
        let claims = self.codec.verify(token, TokenType::Access)?;

        let user_id =
            UserId::parse_str(&claims.sub).map_err(|_| AuthError::InvalidTokenPayload)?;

        let repo = &self.user_repo;
        let id = &user_id;
        let user = retry_store(self.config.store_retry, move || repo.find_by_id(id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if require_active && !user.is_active {
            return Err(AuthError::UserInactive);
        }

        Ok(user)
    }

    /// Strict variant for ordinary endpoints
    pub async fn resolve_active(&self, token: &str) -> AuthResult<User> {
        self.resolve(token, true).await
    }

    /// Permissive variant for the taxpayer claim workflow
    pub async fn resolve_any(&self, token: &str) -> AuthResult<User> {
        self.resolve(token, false).await
    }
}

/// Admin gate
pub fn require_admin(user: &User) -> AuthResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AuthError::AdminRequired)
    }
}

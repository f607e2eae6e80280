//! Login Use Case
//!
//! Authenticates email + password and issues a token pair.

use std::sync::Arc;

use platform::password::{
    ClearTextPassword, Verification, verify_blocking, verify_dummy_blocking,
};

use crate::application::config::AuthConfig;
use crate::application::store::retry_store;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::token::{TokenCodec, TokenPair};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U> LoginUseCase<U>
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

    /// Resolve credentials to a user
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`
    /// after the same Argon2 work. A store outage is reported as such, never
    /// as an unknown email.
    pub async fn authenticate(&self, email: &str, password: String) -> AuthResult<User> {
        let params = self.config.password_params;
        let password = ClearTextPassword::for_verification(password);

        let Ok(email) = Email::new(email) else {
            verify_dummy_blocking(password, params).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let repo = &self.user_repo;
        let policy = self.config.store_retry;
        let lookup = &email;
        let Some(mut user) = retry_store(policy, move || repo.find_by_email(lookup)).await? else {
            verify_dummy_blocking(password, params).await?;
            return Err(AuthError::InvalidCredentials);
        };

        match verify_blocking(password, user.password_hash.clone(), params).await? {
            Verification::Mismatch => return Err(AuthError::InvalidCredentials),
            Verification::Match => {}
            Verification::Outdated(upgraded) => {
                user.set_password_hash(upgraded);
                let updated = &user;
                // The old digest still verifies, so a failed upgrade is retried next login
                match retry_store(policy, move || repo.update(updated)).await {
                    Ok(()) => {
                        tracing::info!(user_id = %user.user_id, "Password digest upgraded");
                    }
                    Err(e) => {
                        tracing::warn!(
                            user_id = %user.user_id,
                            error = %e,
                            "Password digest upgrade failed"
                        );
                    }
                }
            }
        }

        Ok(user)
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<TokenPair> {
        let user = self.authenticate(&input.email, input.password).await?;

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        let pair = self.codec.issue_pair(&user.user_id.to_string())?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(pair)
    }
}

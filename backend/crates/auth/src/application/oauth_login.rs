//! OAuth Login Use Case
//!
//! Authorization-code flow with PKCE. The browser round trip carries `state`
//! and the code verifier in a short-lived HttpOnly cookie; the callback
//! concludes in the same token issuance as password login.

use std::sync::Arc;

use platform::crypto::{constant_time_eq, pkce_challenge, random_token};
use platform::password::{ClearTextPassword, hash_blocking};

use crate::application::config::AuthConfig;
use crate::application::store::{create_user, retry_store};
use crate::domain::entity::user::{User, UserProfile};
use crate::domain::repository::{OAuthProvider, UserRepository};
use crate::domain::token::{TokenCodec, TokenPair};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Values produced when starting the flow
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub authorize_url: String,
    /// Opaque value to store in the round-trip cookie
    pub cookie_value: String,
}

/// OAuth login use case
pub struct OAuthLoginUseCase<U, P>
where
    U: UserRepository,
    P: OAuthProvider,
{
    user_repo: Arc<U>,
    provider: Arc<P>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, P> OAuthLoginUseCase<U, P>
where
    U: UserRepository,
    P: OAuthProvider,
{
    pub fn new(
        user_repo: Arc<U>,
        provider: Arc<P>,
        codec: Arc<TokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            provider,
            codec,
            config,
        }
    }

    pub fn begin(&self) -> AuthResult<OAuthStart> {
        let state = random_token(32);
        let verifier = random_token(48);
        let authorize_url = self
            .provider
            .authorize_url(&state, &pkce_challenge(&verifier))?;

        Ok(OAuthStart {
            authorize_url,
            cookie_value: format!("{}.{}", state, verifier),
        })
    }

    /// Check `state`, exchange `code`, then find or create the account
    pub async fn complete(
        &self,
        code: &str,
        state: &str,
        cookie_value: Option<&str>,
    ) -> AuthResult<TokenPair> {
        let (expected_state, verifier) = cookie_value
            .and_then(|v| v.split_once('.'))
            .ok_or(AuthError::OAuthStateMismatch)?;
        if !constant_time_eq(expected_state.as_bytes(), state.as_bytes()) {
            return Err(AuthError::OAuthStateMismatch);
        }

        let identity = self.provider.fetch_identity(code, verifier).await?;
        let email = Email::new(&identity.email)
            .map_err(|_| AuthError::OAuthProvider("provider returned an invalid email".into()))?;

        let repo = &self.user_repo;
        let policy = self.config.store_retry;
        let lookup = &email;
        let existing = retry_store(policy, move || repo.find_by_email(lookup)).await?;

        let user = match existing {
            Some(user) => user,
            None => {
                // Password login stays unusable until the user sets one
                let password = ClearTextPassword::for_verification(random_token(32));
                let password_hash = hash_blocking(password, self.config.password_params).await?;
                let user = User::new(
                    email,
                    password_hash,
                    UserProfile {
                        nama: identity.name,
                        ..Default::default()
                    },
                );
                create_user(policy, repo.as_ref(), &user).await?;
                tracing::info!(user_id = %user.user_id, "User created via OAuth");
                user
            }
        };

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        let pair = self.codec.issue_pair(&user.user_id.to_string())?;

        tracing::info!(user_id = %user.user_id, "User logged in via OAuth");

        Ok(pair)
    }
}

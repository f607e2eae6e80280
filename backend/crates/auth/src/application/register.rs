//! Register Use Case
//!
//! Creates a new active, unverified, non-admin account.

use std::sync::Arc;

use platform::password::{ClearTextPassword, hash_blocking};

use crate::application::config::AuthConfig;
use crate::application::store::{create_user, retry_store};
use crate::domain::entity::user::{User, UserProfile};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub profile: UserProfile,
}

/// Validated registration fields
pub(crate) struct NewCredentials {
    pub email: Email,
    pub password: ClearTextPassword,
}

/// Validate email and password policy, collecting every field violation
pub(crate) fn validate_credentials(
    email: &str,
    password: String,
    password_confirm: Option<&str>,
) -> AuthResult<NewCredentials> {
    let mut violations = Vec::new();

    let email = match Email::new(email) {
        Ok(email) => Some(email),
        Err(e) => {
            violations.push(("email", e.to_string()));
            None
        }
    };

    if let Some(confirm) = password_confirm {
        if confirm != password {
            violations.push(("password_confirm", "Passwords do not match".to_string()));
        }
    }

    let password = match ClearTextPassword::new(password) {
        Ok(password) => Some(password),
        Err(e) => {
            violations.push(("password", e.to_string()));
            None
        }
    };

    match (email, password) {
        (Some(email), Some(password)) if violations.is_empty() => {
            Ok(NewCredentials { email, password })
        }
        _ => Err(AuthError::Validation(violations)),
    }
}

/// Register use case
pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let NewCredentials { email, password } =
            validate_credentials(&input.email, input.password, Some(&input.password_confirm))?;

        let repo = &self.user_repo;
        let policy = self.config.store_retry;
        {
            let email = &email;
            if retry_store(policy, move || repo.exists_by_email(email)).await? {
                return Err(AuthError::EmailTaken);
            }
        }

        let password_hash = hash_blocking(password, self.config.password_params).await?;
        let user = User::new(email, password_hash, input.profile);

        // A concurrent registration with the same email surfaces as EmailTaken here
        create_user(policy, repo.as_ref(), &user).await?;

        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(user)
    }
}

//! Admin User Management Use Case

use std::sync::Arc;

use platform::password::hash_blocking;

use crate::application::config::AuthConfig;
use crate::application::register::{NewCredentials, validate_credentials};
use crate::application::store::{create_user, retry_store};
use crate::domain::entity::user::{User, UserProfile};
use crate::domain::repository::{UserPage, UserRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Admin create input
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub profile: UserProfile,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Default)]
pub struct UpdateUserInput {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub nama: Option<String>,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
}

/// Listing parameters after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

/// Admin user management use case
///
/// Callers must have passed the admin gate.
pub struct AdminUsersUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> AdminUsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> AuthResult<UserPage> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let repo = &self.user_repo;
        retry_store(self.config.store_retry, move || {
            repo.list(search, page.offset(), page.limit)
        })
        .await
    }

    pub async fn create(&self, input: CreateUserInput) -> AuthResult<User> {
        let NewCredentials { email, password } =
            validate_credentials(&input.email, input.password, None)?;

        let repo = &self.user_repo;
        let policy = self.config.store_retry;
        {
            let email = &email;
            if retry_store(policy, move || repo.exists_by_email(email)).await? {
                return Err(AuthError::EmailTaken);
            }
        }

        let password_hash = hash_blocking(password, self.config.password_params).await?;
        let mut user = User::new(email, password_hash, input.profile);
        user.is_admin = input.is_admin;
        user.is_active = input.is_active;

        create_user(policy, repo.as_ref(), &user).await?;

        tracing::info!(user_id = %user.user_id, is_admin = user.is_admin, "User created by admin");

        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &User,
        target_id: UserId,
        input: UpdateUserInput,
    ) -> AuthResult<User> {
        if target_id == actor.user_id && input.is_admin == Some(false) {
            return Err(AuthError::CannotDemoteSelf);
        }

        let repo = &self.user_repo;
        let policy = self.config.store_retry;
        let id = &target_id;
        let mut user = retry_store(policy, move || repo.find_by_id(id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(admin) = input.is_admin {
            user.set_admin(admin);
        }
        if let Some(active) = input.is_active {
            user.set_active(active);
        }
        if let Some(verified) = input.is_verified {
            user.set_verified(verified);
        }
        if input.nama.is_some() {
            user.nama = input.nama;
        }
        if input.telepon.is_some() {
            user.telepon = input.telepon;
        }
        if input.alamat.is_some() {
            user.alamat = input.alamat;
        }

        let updated = &user;
        retry_store(policy, move || repo.update(updated)).await?;

        tracing::info!(
            actor = %actor.user_id,
            user_id = %user.user_id,
            is_admin = user.is_admin,
            is_active = user.is_active,
            "User updated by admin"
        );

        Ok(user)
    }

    pub async fn delete(&self, actor: &User, target_id: UserId) -> AuthResult<()> {
        if target_id == actor.user_id {
            return Err(AuthError::CannotDeleteSelf);
        }

        let repo = &self.user_repo;
        let id = &target_id;
        if !retry_store(self.config.store_retry, move || repo.delete(id)).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(actor = %actor.user_id, user_id = %target_id, "User deleted by admin");

        Ok(())
    }
}

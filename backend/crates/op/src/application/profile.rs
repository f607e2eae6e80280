//! Profile Use Case

use std::sync::Arc;

use auth::models::User;

use crate::application::config::OpConfig;
use crate::application::store::retry_store;
use crate::domain::entity::TaxSubject;
use crate::domain::repository::OpRepository;
use crate::error::{OpError, OpResult};

pub struct ProfileUseCase<R>
where
    R: OpRepository,
{
    repo: Arc<R>,
    config: Arc<OpConfig>,
}

impl<R> ProfileUseCase<R>
where
    R: OpRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<OpConfig>) -> Self {
        Self { repo, config }
    }

    /// Taxpayer linked to `user`
    ///
    /// An unavailable store reads as "no taxpayer" so the profile still
    /// renders; other failures propagate.
    pub async fn linked_taxpayer(&self, user: &User) -> OpResult<Option<TaxSubject>> {
        let repo = &self.repo;
        let email = &user.email;
        match retry_store(self.config.store_retry, move || {
            repo.find_taxpayer_by_email(email)
        })
        .await
        {
            Err(OpError::ServiceUnavailable) => {
                tracing::warn!(user_id = %user.user_id, "Taxpayer lookup unavailable, profile degraded");
                Ok(None)
            }
            other => other,
        }
    }
}

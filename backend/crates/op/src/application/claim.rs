//! Taxpayer Claim Use Case
//!
//! Binds an account to a taxpayer identity. The claimed name must match the
//! name of the taxpayer linked to the SPOP with the given key, after
//! normalization. A successful claim writes the account email (and phone, if
//! given) onto the taxpayer and marks the account verified.

use std::sync::Arc;

use auth::models::User;

use crate::application::config::OpConfig;
use crate::application::store::retry_store;
use crate::domain::name::normalize_name;
use crate::domain::nop::Nop;
use crate::domain::repository::{ClaimOutcome, ClaimRequest, OpRepository};
use crate::error::{OpError, OpResult};

pub struct ClaimInput {
    pub name: String,
    /// The seven location codes, in NOP order
    pub parts: [String; 7],
    pub phone: Option<String>,
}

pub struct ClaimUseCase<R>
where
    R: OpRepository,
{
    repo: Arc<R>,
    config: Arc<OpConfig>,
}

impl<R> ClaimUseCase<R>
where
    R: OpRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<OpConfig>) -> Self {
        Self { repo, config }
    }

    /// Returns whether the claim matched
    pub async fn execute(&self, user: &User, input: ClaimInput) -> OpResult<bool> {
        let nop = Nop::from_parts(input.parts.each_ref().map(String::as_str))?;

        if normalize_name(&input.name).is_empty() {
            return Err(OpError::Validation(vec![(
                "NM_WP",
                "Name is required".to_string(),
            )]));
        }
        let phone = input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let request = ClaimRequest {
            user_id: user.user_id,
            email: &user.email,
            claimed_name: &input.name,
            nop: &nop,
            phone,
        };
        let repo = &self.repo;
        let request = &request;
        let outcome = retry_store(self.config.store_retry, move || {
            repo.claim_taxpayer(request)
        })
        .await?;

        match outcome {
            ClaimOutcome::NoMatch => {
                tracing::info!(user_id = %user.user_id, nop = %nop, "Claim did not match");
                Ok(false)
            }
            ClaimOutcome::Claimed => {
                tracing::info!(user_id = %user.user_id, nop = %nop, "Taxpayer claimed");
                Ok(true)
            }
            ClaimOutcome::AlreadyOwned => Ok(true),
            ClaimOutcome::ClaimedByOther => Err(OpError::ClaimConflict),
        }
    }
}

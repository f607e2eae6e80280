//! Owner-scoped SPOP and SPPT views
//!
//! A user sees exactly the objects whose taxpayer carries the user's email.
//! A direct request for a key the user does not own fails
//! `ObjectForbidden` when the object exists and `ObjectNotFound` otherwise.

use std::sync::Arc;

use auth::models::Email;

use crate::application::config::OpConfig;
use crate::application::store::retry_store;
use crate::domain::entity::{Sppt, SpptYear, SpopView};
use crate::domain::name::normalize_name;
use crate::domain::nop::Nop;
use crate::domain::repository::{OpRepository, SortOrder, SpopQuery, SpopSort};
use crate::error::{OpError, OpResult};

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// SPOP listing request as received
#[derive(Debug, Clone, Default)]
pub struct SpopListParams {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<SpopSort>,
    pub sort_order: Option<SortOrder>,
}

/// One page of owned objects
#[derive(Debug, Clone)]
pub struct SpopListing {
    pub items: Vec<SpopView>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

pub struct TaxObjectUseCase<R>
where
    R: OpRepository,
{
    repo: Arc<R>,
    config: Arc<OpConfig>,
}

impl<R> TaxObjectUseCase<R>
where
    R: OpRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<OpConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn list_spop(&self, email: &Email, params: SpopListParams) -> OpResult<SpopListing> {
        let page = params.page.unwrap_or(1).max(1);
        let per_page = params
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let query = SpopQuery {
            search: params
                .search
                .as_deref()
                .map(normalize_name)
                .filter(|s| !s.is_empty()),
            sort_by: params.sort_by.unwrap_or_default(),
            sort_order: params.sort_order.unwrap_or_default(),
            offset: (page - 1).saturating_mul(per_page),
            limit: per_page,
        };

        let repo = &self.repo;
        let query = &query;
        let result = retry_store(self.config.store_retry, move || {
            repo.list_owned_spop(email, query)
        })
        .await?;

        Ok(SpopListing {
            items: result.items,
            page,
            per_page,
            total: result.total,
            total_pages: (result.total + per_page - 1) / per_page,
        })
    }

    /// Ok iff `email` owns `nop`
    pub async fn authorize(&self, email: &Email, nop: &Nop) -> OpResult<()> {
        let repo = &self.repo;
        let policy = self.config.store_retry;

        if retry_store(policy, move || repo.owns_object(email, nop)).await? {
            return Ok(());
        }
        if retry_store(policy, move || repo.object_exists(nop)).await? {
            tracing::debug!(nop = %nop, "Object owned by another taxpayer");
            Err(OpError::ObjectForbidden)
        } else {
            Err(OpError::ObjectNotFound)
        }
    }

    pub async fn sppt_years(&self, email: &Email, raw_nop: &str) -> OpResult<Vec<SpptYear>> {
        let nop = Nop::parse(raw_nop)?;
        self.authorize(email, &nop).await?;

        let repo = &self.repo;
        let nop = &nop;
        retry_store(self.config.store_retry, move || {
            repo.owned_sppt_years(email, nop)
        })
        .await
    }

    pub async fn sppt_detail(&self, email: &Email, year: &str, raw_nop: &str) -> OpResult<Sppt> {
        let nop = Nop::parse(raw_nop)?;
        self.authorize(email, &nop).await?;

        let repo = &self.repo;
        let nop = &nop;
        retry_store(self.config.store_retry, move || {
            repo.find_owned_sppt(email, nop, year)
        })
        .await?
        .ok_or(OpError::SpptNotFound)
    }

    /// Every owned year, newest first
    pub async fn sppt_batch(&self, email: &Email, raw_nop: &str) -> OpResult<Vec<Sppt>> {
        let nop = Nop::parse(raw_nop)?;
        self.authorize(email, &nop).await?;

        let repo = &self.repo;
        let nop = &nop;
        retry_store(self.config.store_retry, move || repo.list_owned_sppt(email, nop)).await
    }
}

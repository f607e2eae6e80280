//! Parcel map lookups

use std::sync::Arc;

use crate::application::config::OpConfig;
use crate::application::store::retry_store;
use crate::domain::entity::{Parcel, ParcelInfo};
use crate::domain::nop::Nop;
use crate::domain::repository::OpRepository;
use crate::error::{OpError, OpResult};

pub struct PetaUseCase<R>
where
    R: OpRepository,
{
    repo: Arc<R>,
    config: Arc<OpConfig>,
}

impl<R> PetaUseCase<R>
where
    R: OpRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<OpConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn parcel(&self, raw_nop: &str) -> OpResult<Parcel> {
        let nop = Nop::parse(raw_nop)?;
        let repo = &self.repo;
        let nop = &nop;
        retry_store(self.config.store_retry, move || repo.find_parcel(nop))
            .await?
            .ok_or(OpError::ParcelNotFound)
    }

    pub async fn parcel_info(&self, raw_nop: &str) -> OpResult<ParcelInfo> {
        let nop = Nop::parse(raw_nop)?;
        let repo = &self.repo;
        let nop = &nop;
        retry_store(self.config.store_retry, move || repo.find_parcel_info(nop))
            .await?
            .ok_or(OpError::ParcelNotFound)
    }

    pub async fn list_nops(&self, limit: Option<i64>) -> OpResult<Vec<String>> {
        let limit = self.config.parcel_list_limit(limit);
        let repo = &self.repo;
        retry_store(self.config.store_retry, move || repo.list_parcel_nops(limit)).await
    }
}

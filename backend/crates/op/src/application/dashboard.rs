//! Admin Dashboard Use Case

use std::sync::Arc;

use crate::application::config::OpConfig;
use crate::application::store::retry_store;
use crate::domain::entity::{BuildingTotals, RegionFilter, SpptTotals};
use crate::domain::repository::OpRepository;
use crate::error::OpResult;

/// Totals plus a description of the applied filter
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub totals: SpptTotals,
    pub buildings: BuildingTotals,
    pub filtered_by: Option<&'static str>,
    pub filter_value: Option<String>,
    pub year_filter: Option<String>,
}

pub struct DashboardUseCase<R>
where
    R: OpRepository,
{
    repo: Arc<R>,
    config: Arc<OpConfig>,
}

impl<R> DashboardUseCase<R>
where
    R: OpRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<OpConfig>) -> Self {
        Self { repo, config }
    }

    /// Callers must have passed the admin gate
    pub async fn stats(&self, filter: RegionFilter) -> OpResult<DashboardStats> {
        let filter = RegionFilter {
            year: non_blank(filter.year),
            kd_propinsi: non_blank(filter.kd_propinsi),
            kd_dati2: non_blank(filter.kd_dati2),
            kd_kecamatan: non_blank(filter.kd_kecamatan),
            kd_kelurahan: non_blank(filter.kd_kelurahan),
        };

        let repo = &self.repo;
        let region = &filter;
        let policy = self.config.store_retry;
        let totals = retry_store(policy, move || repo.sppt_totals(region)).await?;
        let buildings = retry_store(policy, move || repo.building_totals(region)).await?;

        let narrowest = filter.narrowest();
        Ok(DashboardStats {
            totals,
            buildings,
            filtered_by: narrowest.map(|(level, _)| level),
            filter_value: narrowest.map(|(_, code)| code.to_string()),
            year_filter: filter.year.clone(),
        })
    }

    /// Tax years offered by the dashboard year filter
    pub async fn years(&self) -> OpResult<Vec<String>> {
        let repo = &self.repo;
        retry_store(self.config.store_retry, move || repo.tax_years()).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

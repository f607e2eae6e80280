//! HTTP Handlers

use std::sync::Arc;

use auth::middleware::CurrentUser;
use auth::models::UserResponse;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use crate::application::{
    ClaimInput, ClaimUseCase, DashboardUseCase, OpConfig, PetaUseCase, ProfileUseCase,
    SpopListParams, TaxObjectUseCase,
};
use crate::domain::entity::{ParcelInfo, RegionFilter, Sppt};
use crate::domain::nop::Nop;
use crate::domain::repository::OpRepository;
use crate::error::OpResult;
use crate::presentation::dto::{
    DashboardFiltersResponse, DashboardQuery, DashboardStatsResponse, ExistsResponse, NopItem,
    NopListQuery, NopRequest, ParcelFeature, ProfileResponse, SpopListQuery, SpopListResponse,
    SpptBatchResponse, SpptYearsResponse, VerifikasiRequest,
};

/// Shared state for tax-object handlers
pub struct OpAppState<R> {
    pub repo: Arc<R>,
    pub config: Arc<OpConfig>,
}

impl<R> Clone for OpAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> OpAppState<R>
where
    R: OpRepository,
{
    pub fn new(repo: R, config: OpConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }

    fn tax_objects(&self) -> TaxObjectUseCase<R> {
        TaxObjectUseCase::new(self.repo.clone(), self.config.clone())
    }
}

// ============================================================================
// SPOP / SPPT
// ============================================================================

/// GET /api/op/spop
pub async fn list_spop<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<SpopListQuery>,
) -> OpResult<Json<SpopListResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let listing = state
        .tax_objects()
        .list_spop(
            &user.email,
            SpopListParams {
                search: query.search,
                page: query.page,
                per_page: query.per_page,
                sort_by: query.sort_by,
                sort_order: query.sort_order,
            },
        )
        .await?;

    Ok(Json(listing.into()))
}

/// POST /api/op/sppt/years
pub async fn sppt_years<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<NopRequest>,
) -> OpResult<Json<SpptYearsResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let available_years = state.tax_objects().sppt_years(&user.email, &req.nop).await?;
    Ok(Json(SpptYearsResponse { available_years }))
}

/// GET /api/op/sppt/{year}/{nop}
pub async fn sppt_detail<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((year, nop)): Path<(String, String)>,
) -> OpResult<Json<Sppt>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let sppt = state
        .tax_objects()
        .sppt_detail(&user.email, &year, &nop)
        .await?;
    Ok(Json(sppt))
}

/// GET /api/op/sppt/batch/{nop}
pub async fn sppt_batch<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(nop): Path<String>,
) -> OpResult<Json<SpptBatchResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let data = state.tax_objects().sppt_batch(&user.email, &nop).await?;
    Ok(Json(SpptBatchResponse { data }))
}

// ============================================================================
// Claim
// ============================================================================

/// POST /api/op/verifikasi
pub async fn verifikasi<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<VerifikasiRequest>,
) -> OpResult<Json<ExistsResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let parts = match req.nop.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(raw) => Nop::parse(raw)?.parts().codes().map(str::to_string),
        None => [
            req.kd_propinsi,
            req.kd_dati2,
            req.kd_kecamatan,
            req.kd_kelurahan,
            req.kd_blok,
            req.no_urut,
            req.kd_jns_op,
        ],
    };

    let use_case = ClaimUseCase::new(state.repo.clone(), state.config.clone());
    let exists = use_case
        .execute(
            &user,
            ClaimInput {
                name: req.nm_wp,
                parts,
                phone: req.telp_wp,
            },
        )
        .await?;

    Ok(Json(ExistsResponse { exists }))
}

// ============================================================================
// Profile
// ============================================================================

/// GET /api/profile/me
pub async fn profile<R>(
    State(state): State<OpAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> OpResult<Json<ProfileResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = ProfileUseCase::new(state.repo.clone(), state.config.clone());
    let taxpayer = use_case.linked_taxpayer(&user).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(&user),
        taxpayer,
    }))
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /api/dashboard/stats (admin)
pub async fn dashboard_stats<R>(
    State(state): State<OpAppState<R>>,
    Query(query): Query<DashboardQuery>,
) -> OpResult<Json<DashboardStatsResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = DashboardUseCase::new(state.repo.clone(), state.config.clone());
    let stats = use_case
        .stats(RegionFilter {
            year: query.year,
            kd_propinsi: query.kd_propinsi,
            kd_dati2: query.kd_dati2,
            kd_kecamatan: query.kd_kecamatan,
            kd_kelurahan: query.kd_kelurahan,
        })
        .await?;

    Ok(Json(stats.into()))
}

/// GET /api/dashboard/filters (admin)
pub async fn dashboard_filters<R>(
    State(state): State<OpAppState<R>>,
) -> OpResult<Json<DashboardFiltersResponse>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = DashboardUseCase::new(state.repo.clone(), state.config.clone());
    let available_years = use_case.years().await?;
    Ok(Json(DashboardFiltersResponse { available_years }))
}

// ============================================================================
// Peta
// ============================================================================

/// GET /api/peta/nop/{nop}
pub async fn parcel<R>(
    State(state): State<OpAppState<R>>,
    Path(nop): Path<String>,
) -> OpResult<Json<ParcelFeature>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = PetaUseCase::new(state.repo.clone(), state.config.clone());
    let parcel = use_case.parcel(&nop).await?;
    Ok(Json(parcel.into()))
}

/// GET /api/peta/nop/{nop}/info
pub async fn parcel_info<R>(
    State(state): State<OpAppState<R>>,
    Path(nop): Path<String>,
) -> OpResult<Json<ParcelInfo>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = PetaUseCase::new(state.repo.clone(), state.config.clone());
    Ok(Json(use_case.parcel_info(&nop).await?))
}

/// GET /api/peta/nop-list
pub async fn parcel_nops<R>(
    State(state): State<OpAppState<R>>,
    Query(query): Query<NopListQuery>,
) -> OpResult<Json<Vec<NopItem>>>
where
    R: OpRepository + Send + Sync + 'static,
{
    let use_case = PetaUseCase::new(state.repo.clone(), state.config.clone());
    let nops = use_case.list_nops(query.limit).await?;
    Ok(Json(nops.into_iter().map(|nop| NopItem { nop }).collect()))
}

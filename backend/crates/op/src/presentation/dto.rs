//! API DTOs (Data Transfer Objects)
//!
//! Tax-object payloads keep the uppercase PBB column names.

use auth::models::UserResponse;
use serde::{Deserialize, Serialize};

use crate::application::{DashboardStats, SpopListing};
use crate::domain::entity::{Parcel, ParcelInfo, Sppt, SpptYear, SpopView, TaxSubject};
use crate::domain::repository::{SortOrder, SpopSort};

// ============================================================================
// SPOP / SPPT
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpopListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<SpopSort>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpopListResponse {
    pub data: Vec<SpopView>,
    pub meta: PageMeta,
}

impl From<SpopListing> for SpopListResponse {
    fn from(listing: SpopListing) -> Self {
        Self {
            data: listing.items,
            meta: PageMeta {
                page: listing.page,
                per_page: listing.per_page,
                total: listing.total,
                total_pages: listing.total_pages,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NopRequest {
    pub nop: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpptYearsResponse {
    pub available_years: Vec<SpptYear>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpptBatchResponse {
    pub data: Vec<Sppt>,
}

// ============================================================================
// Claim
// ============================================================================

/// Claim form; either the seven codes or a full `NOP`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VerifikasiRequest {
    pub nm_wp: String,
    #[serde(default)]
    pub kd_propinsi: String,
    #[serde(default)]
    pub kd_dati2: String,
    #[serde(default)]
    pub kd_kecamatan: String,
    #[serde(default)]
    pub kd_kelurahan: String,
    #[serde(default)]
    pub kd_blok: String,
    #[serde(default)]
    pub no_urut: String,
    #[serde(default)]
    pub kd_jns_op: String,
    pub telp_wp: Option<String>,
    pub nop: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub taxpayer: Option<TaxSubject>,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<String>,
    pub kd_propinsi: Option<String>,
    pub kd_dati2: Option<String>,
    pub kd_kecamatan: Option<String>,
    pub kd_kelurahan: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatsResponse {
    pub total_sppt: i64,
    pub total_sppt_lunas: i64,
    pub total_sppt_belum_lunas: i64,
    pub total_pbb_terhutang: i64,
    pub total_bangunan: i64,
    pub total_nilai_bangunan: i64,
    pub rata_rata_luas_bangunan: f64,
    pub filtered_by: Option<&'static str>,
    pub filter_value: Option<String>,
    pub year_filter: Option<String>,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_sppt: stats.totals.total_sppt,
            total_sppt_lunas: stats.totals.total_sppt_lunas,
            total_sppt_belum_lunas: stats.totals.total_sppt_belum_lunas,
            total_pbb_terhutang: stats.totals.total_pbb_terhutang,
            total_bangunan: stats.buildings.total_bangunan,
            total_nilai_bangunan: stats.buildings.total_nilai_bangunan,
            rata_rata_luas_bangunan: stats.buildings.rata_rata_luas_bangunan,
            filtered_by: stats.filtered_by,
            filter_value: stats.filter_value,
            year_filter: stats.year_filter,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardFiltersResponse {
    pub available_years: Vec<String>,
}

// ============================================================================
// Peta
// ============================================================================

/// GeoJSON Feature for one parcel
#[derive(Debug, Clone, Serialize)]
pub struct ParcelFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: serde_json::Value,
    pub properties: ParcelInfo,
}

impl From<Parcel> for ParcelFeature {
    fn from(parcel: Parcel) -> Self {
        Self {
            kind: "Feature",
            geometry: parcel.geometry,
            properties: parcel.info,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NopListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NopItem {
    pub nop: String,
}

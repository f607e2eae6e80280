//! Repository Traits
//!
//! Every owner-scoped query joins `spop` to `dat_subjek_pajak` on
//! `subjek_pajak_id` and filters on `email_wp`.

use auth::models::{Email, UserId};
use serde::Deserialize;

use crate::domain::entity::{
    BuildingTotals, Parcel, ParcelInfo, RegionFilter, Sppt, SpptTotals, SpptYear, SpopView,
    TaxSubject,
};
use crate::domain::nop::Nop;
use crate::error::OpResult;

/// Sortable SPOP columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpopSort {
    #[default]
    KdPropinsi,
    JalanOp,
    LuasBumi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Owned-object listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpopQuery {
    /// Already normalized; matched as a substring of the normalized name
    pub search: Option<String>,
    pub sort_by: SpopSort,
    pub sort_order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct SpopPage {
    pub items: Vec<SpopView>,
    pub total: i64,
}

/// Claim attempt on the taxpayer linked to an SPOP
#[derive(Debug, Clone)]
pub struct ClaimRequest<'a> {
    pub user_id: UserId,
    pub email: &'a Email,
    pub claimed_name: &'a str,
    pub nop: &'a Nop,
    pub phone: Option<&'a str>,
}

/// Result of a claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// No SPOP with that key, or the name does not match
    NoMatch,
    /// Link written, user marked verified
    Claimed,
    /// Already linked to this user; flags refreshed
    AlreadyOwned,
    /// Linked to another email; nothing written
    ClaimedByOther,
}

#[trait_variant::make(OpRepository: Send)]
pub trait LocalOpRepository {
    /// Taxpayer record linked to `email`
    async fn find_taxpayer_by_email(&self, email: &Email) -> OpResult<Option<TaxSubject>>;

    async fn list_owned_spop(&self, email: &Email, query: &SpopQuery) -> OpResult<SpopPage>;

    /// Whether `email` owns the SPOP keyed by `nop`
    async fn owns_object(&self, email: &Email, nop: &Nop) -> OpResult<bool>;

    /// Whether the SPOP keyed by `nop` exists at all
    async fn object_exists(&self, nop: &Nop) -> OpResult<bool>;

    async fn owned_sppt_years(&self, email: &Email, nop: &Nop) -> OpResult<Vec<SpptYear>>;

    async fn find_owned_sppt(&self, email: &Email, nop: &Nop, year: &str)
    -> OpResult<Option<Sppt>>;

    /// Newest year first
    async fn list_owned_sppt(&self, email: &Email, nop: &Nop) -> OpResult<Vec<Sppt>>;

    /// Match and bind in one transaction
    async fn claim_taxpayer(&self, request: &ClaimRequest<'_>) -> OpResult<ClaimOutcome>;

    async fn sppt_totals(&self, filter: &RegionFilter) -> OpResult<SpptTotals>;

    /// Active buildings only; the year filter does not apply
    async fn building_totals(&self, filter: &RegionFilter) -> OpResult<BuildingTotals>;

    /// Every distinct SPPT tax year, newest first
    async fn tax_years(&self) -> OpResult<Vec<String>>;

    async fn find_parcel(&self, nop: &Nop) -> OpResult<Option<Parcel>>;

    async fn find_parcel_info(&self, nop: &Nop) -> OpResult<Option<ParcelInfo>>;

    /// Distinct parcel NOPs in ascending order
    async fn list_parcel_nops(&self, limit: i64) -> OpResult<Vec<String>>;
}

//! Domain Layer
//!
//! NOP keys, taxpayer name matching, read models and repository traits.

pub mod entity;
pub mod name;
pub mod nop;
pub mod repository;

pub use entity::{Parcel, ParcelInfo, RegionFilter, Sppt, SpptTotals, SpptYear, Spop, SpopView, TaxSubject};
pub use nop::Nop;
pub use repository::{ClaimOutcome, ClaimRequest, OpRepository, SpopPage, SpopQuery, SpopSort, SortOrder};

//! Application Layer
//!
//! Use cases over the tax-object store.

pub mod claim;
pub mod config;
pub mod dashboard;
pub mod peta;
pub mod profile;
mod store;
pub mod tax_object;

// Re-exports
pub use claim::{ClaimInput, ClaimUseCase};
pub use config::OpConfig;
pub use dashboard::{DashboardStats, DashboardUseCase};
pub use peta::PetaUseCase;
pub use profile::ProfileUseCase;
pub use tax_object::{SpopListParams, SpopListing, TaxObjectUseCase};

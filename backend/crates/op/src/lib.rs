//! Op (Objek Pajak) Backend Module
//!
//! Tax objects scoped to the taxpayer identity bound to the signed-in account.
//!
//! Clean Architecture structure:
//! - `domain/` - NOP keys, name matching, read models, repository trait
//! - `application/` - Ownership checks, claim workflow, profile, dashboard, peta
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Ownership Model
//! An account owns every SPOP whose taxpayer (`dat_subjek_pajak`) carries the
//! account email in `EMAIL_WP`. The link is written by a successful claim.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::OpConfig;
pub use domain::nop::Nop;
pub use error::{OpError, OpResult};
pub use infra::postgres::PgOpRepository;
pub use presentation::handlers::OpAppState;
pub use presentation::router::op_router;

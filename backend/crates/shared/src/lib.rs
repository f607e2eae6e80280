//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types and result aliases (RFC 7807 responses)
//! - Typed ID wrappers
//! - Transient data-store failure classification
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;

    pub use app_error::{AppError, AppResult, FieldError};
    #[cfg(feature = "sqlx")]
    pub use conversions::is_transient_db_error;
    pub use conversions::is_transient_sqlstate;
    pub use kind::ErrorKind;
}
pub mod id;

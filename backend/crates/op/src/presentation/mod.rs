//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::OpAppState;
pub use router::op_router;

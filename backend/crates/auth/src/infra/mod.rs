//! Infrastructure Layer
//!
//! Database, in-process and identity-provider implementations.

pub mod google;
pub mod memory;
pub mod postgres;

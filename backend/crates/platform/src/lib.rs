//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id, tunable cost)
//! - Bounded exponential-backoff retry for data access
//! - Random tokens and PKCE helpers
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod retry;

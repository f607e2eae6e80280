//! Domain Layer
//!
//! Contains entities, value objects, the token codec, and repository traits.

pub mod entity;
pub mod repository;
pub mod token;
pub mod value_object;

// Re-exports
pub use entity::user::{User, UserProfile};
pub use repository::{OAuthProvider, RevocationStore, UserRepository};
pub use token::{Claims, TokenCodec, TokenPair, TokenType};

//! Application Layer
//!
//! Use cases and application services.

pub mod admin_users;
pub mod config;
pub mod current_user;
pub mod login;
pub mod logout;
pub mod oauth_login;
pub mod refresh;
pub mod register;
mod store;

// Re-exports
pub use admin_users::{AdminUsersUseCase, CreateUserInput, PageRequest, UpdateUserInput};
pub use config::{AuthConfig, GoogleOAuthConfig};
pub use current_user::{CurrentUserUseCase, require_admin};
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use oauth_login::{OAuthLoginUseCase, OAuthStart};
pub use refresh::RefreshUseCase;
pub use register::{RegisterInput, RegisterUseCase};

//! Auth Middleware
//!
//! Bearer-token guards for protected routes. A successful guard stores the
//! loaded [`CurrentUser`] in request extensions for downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::config::AuthConfig;
use crate::application::{CurrentUserUseCase, require_admin};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::token::TokenCodec;
use crate::error::AuthError;

/// Authenticated user stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware state, also handed to other crates' routers
pub struct AuthGuard<U> {
    pub users: Arc<U>,
    pub codec: Arc<TokenCodec>,
    pub config: Arc<AuthConfig>,
}

impl<U> Clone for AuthGuard<U> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            codec: self.codec.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U> AuthGuard<U>
where
    U: UserRepository,
{
    fn use_case(&self) -> CurrentUserUseCase<U> {
        CurrentUserUseCase::new(self.users.clone(), self.codec.clone(), self.config.clone())
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Requires a valid access token for an active user
pub async fn require_active_user<U>(
    State(guard): State<AuthGuard<U>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let user = guard.use_case().resolve_active(&token).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Requires a valid access token; inactive users pass
///
/// Used by the taxpayer claim workflow, which must be reachable before an
/// account is fully set up.
pub async fn require_user<U>(
    State(guard): State<AuthGuard<U>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let user = guard.use_case().resolve_any(&token).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Requires an admin; must run after one of the user guards
pub async fn require_admin_user(req: Request, next: Next) -> Result<Response, AuthError> {
    let CurrentUser(user) = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingToken)?;
    require_admin(user)?;
    Ok(next.run(req).await)
}

//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::domain::repository::{OAuthProvider, RevocationStore, UserRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_active_user, require_admin_user};

/// Create the Auth router (`/auth/*` and `/admin/users*`)
pub fn auth_router<U, V, P>(state: AuthAppState<U, V, P>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    V: RevocationStore + Send + Sync + 'static,
    P: OAuthProvider + Send + Sync + 'static,
{
    let guard = state.guard();

    let public = Router::new()
        .route("/auth/register", post(handlers::register::<U, V, P>))
        .route("/auth/login", post(handlers::login::<U, V, P>))
        .route("/auth/refresh", post(handlers::refresh::<U, V, P>))
        .route("/auth/logout", post(handlers::logout::<U, V, P>))
        .route(
            "/auth/oauth/google/redirect",
            get(handlers::oauth_redirect::<U, V, P>),
        )
        .route(
            "/auth/oauth/google/callback",
            get(handlers::oauth_callback::<U, V, P>),
        );

    let authenticated = Router::new()
        .route("/auth/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            guard.clone(),
            require_active_user::<U>,
        ));

    // Layers run bottom-up: the user guard first, then the admin gate
    let admin = Router::new()
        .route(
            "/admin/users",
            get(handlers::list_users::<U, V, P>).post(handlers::create_user::<U, V, P>),
        )
        .route(
            "/admin/users/{id}",
            patch(handlers::update_user::<U, V, P>).delete(handlers::delete_user::<U, V, P>),
        )
        .route_layer(middleware::from_fn(require_admin_user))
        .route_layer(middleware::from_fn_with_state(guard, require_active_user::<U>));

    public
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}

//! Tax-object Router

use auth::domain::repository::UserRepository;
use auth::middleware::{AuthGuard, require_active_user, require_admin_user, require_user};
use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::OpRepository;
use crate::presentation::handlers::{self, OpAppState};

/// Create the tax-object router (`/op/*`, `/profile/me`, `/dashboard/*`, `/peta/*`)
pub fn op_router<R, U>(state: OpAppState<R>, guard: AuthGuard<U>) -> Router
where
    R: OpRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    // Claims must work before the account is fully set up
    let claim = Router::new()
        .route("/op/verifikasi", post(handlers::verifikasi::<R>))
        .route_layer(middleware::from_fn_with_state(
            guard.clone(),
            require_user::<U>,
        ));

    let authenticated = Router::new()
        .route("/op/spop", get(handlers::list_spop::<R>))
        .route("/op/sppt/years", post(handlers::sppt_years::<R>))
        .route("/op/sppt/batch/{nop}", get(handlers::sppt_batch::<R>))
        .route("/op/sppt/{year}/{nop}", get(handlers::sppt_detail::<R>))
        .route("/profile/me", get(handlers::profile::<R>))
        .route("/peta/nop-list", get(handlers::parcel_nops::<R>))
        .route("/peta/nop/{nop}", get(handlers::parcel::<R>))
        .route("/peta/nop/{nop}/info", get(handlers::parcel_info::<R>))
        .route_layer(middleware::from_fn_with_state(
            guard.clone(),
            require_active_user::<U>,
        ));

    // Layers run bottom-up: the user guard first, then the admin gate
    let admin = Router::new()
        .route("/dashboard/stats", get(handlers::dashboard_stats::<R>))
        .route("/dashboard/filters", get(handlers::dashboard_filters::<R>))
        .route_layer(middleware::from_fn(require_admin_user))
        .route_layer(middleware::from_fn_with_state(guard, require_active_user::<U>));

    claim.merge(authenticated).merge(admin).with_state(state)
}

//! HTTP Handlers

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Extension, Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use platform::cookie::{CookieConfig, delete_cookie_header, extract_cookie, set_cookie_header};
use reqwest::Url;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::{
    AdminUsersUseCase, CreateUserInput, LoginInput, LoginUseCase, LogoutUseCase,
    OAuthLoginUseCase, PageRequest, RefreshUseCase, RegisterInput, RegisterUseCase,
    UpdateUserInput,
};
use crate::domain::entity::user::UserProfile;
use crate::domain::repository::{OAuthProvider, RevocationStore, UserRepository};
use crate::domain::token::TokenCodec;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CreateUserRequest, ListUsersQuery, LoginForm, LogoutRequest, MessageResponse,
    OAuthCallbackQuery, RefreshRequest, RegisterRequest, TokenResponse, UpdateUserRequest,
    UserListResponse, UserResponse,
};
use crate::presentation::middleware::{AuthGuard, CurrentUser};

/// Round-trip cookie for the OAuth flow, scoped to the OAuth routes
pub const OAUTH_COOKIE_NAME: &str = "oauth_google";
pub const OAUTH_COOKIE_PATH: &str = "/api/auth/oauth/google";

/// Shared state for auth handlers
pub struct AuthAppState<U, V, P> {
    pub users: Arc<U>,
    pub revocations: Arc<V>,
    /// `None` when Google login is not configured
    pub oauth: Option<Arc<P>>,
    pub codec: Arc<TokenCodec>,
    pub config: Arc<AuthConfig>,
}

impl<U, V, P> Clone for AuthAppState<U, V, P> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            revocations: self.revocations.clone(),
            oauth: self.oauth.clone(),
            codec: self.codec.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U, V, P> AuthAppState<U, V, P> {
    pub fn new(users: U, revocations: V, oauth: Option<P>, config: AuthConfig) -> Self {
        let codec = TokenCodec::new(
            &config.access_secret,
            &config.refresh_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        Self {
            users: Arc::new(users),
            revocations: Arc::new(revocations),
            oauth: oauth.map(Arc::new),
            codec: Arc::new(codec),
            config: Arc::new(config),
        }
    }

    /// Guard state for protecting routes in this and other routers
    pub fn guard(&self) -> AuthGuard<U> {
        AuthGuard {
            users: self.users.clone(),
            codec: self.codec.clone(),
            config: self.config.clone(),
        }
    }

    fn oauth_cookie(&self) -> CookieConfig {
        CookieConfig::oauth(OAUTH_COOKIE_NAME, OAUTH_COOKIE_PATH, self.config.cookie_secure)
    }
}

// ============================================================================
// Register / Login / Me
// ============================================================================

/// POST /api/auth/register
pub async fn register<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<Json<UserResponse>>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.users.clone(), state.config.clone());

    let user = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            password_confirm: req.password_confirm,
            profile: UserProfile {
                nama: req.nama,
                telepon: req.telepon,
                alamat: req.alamat,
            },
        })
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/auth/login (form: username, password)
pub async fn login<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Form(form): Form<LoginForm>,
) -> AuthResult<Json<TokenResponse>>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.users.clone(),
        state.codec.clone(),
        state.config.clone(),
    );

    let pair = use_case
        .execute(LoginInput {
            email: form.username,
            password: form.password,
        })
        .await?;

    Ok(Json(pair.into()))
}

/// GET /api/auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    U: UserRepository + Send + Sync + 'static,
    V: RevocationStore + Send + Sync + 'static,
{
    let use_case = RefreshUseCase::new(
        state.users.clone(),
        state.revocations.clone(),
        state.codec.clone(),
        state.config.clone(),
    );

    let pair = use_case.execute(&req.refresh_token).await?;

    Ok(Json(pair.into()))
}

/// POST /api/auth/logout (optional JSON body: refresh_token)
pub async fn logout<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    body: Bytes,
) -> Json<MessageResponse>
where
    V: RevocationStore + Send + Sync + 'static,
{
    let req: LogoutRequest = serde_json::from_slice(&body).unwrap_or_default();

    let use_case = LogoutUseCase::new(
        state.revocations.clone(),
        state.codec.clone(),
        state.config.clone(),
    );
    use_case.execute(req.refresh_token.as_deref()).await;

    Json(MessageResponse::new("Logged out successfully"))
}

// ============================================================================
// OAuth (Google)
// ============================================================================

fn oauth_provider<U, V, P>(state: &AuthAppState<U, V, P>) -> AuthResult<Arc<P>> {
    state.oauth.clone().ok_or(AuthError::OAuthNotConfigured)
}

/// GET /api/auth/oauth/google/redirect
pub async fn oauth_redirect<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
) -> AuthResult<Response>
where
    U: UserRepository + Send + Sync + 'static,
    P: OAuthProvider + Send + Sync + 'static,
{
    let use_case = OAuthLoginUseCase::new(
        state.users.clone(),
        oauth_provider(&state)?,
        state.codec.clone(),
        state.config.clone(),
    );
    let start = use_case.begin()?;

    let cookie = set_cookie_header(&state.oauth_cookie(), &start.cookie_value)
        .ok_or_else(|| AuthError::Internal("Invalid OAuth cookie value".to_string()))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&start.authorize_url),
    )
        .into_response())
}

/// GET /api/auth/oauth/google/callback
///
/// Always answers with a redirect to the frontend: tokens on success,
/// an `error` code otherwise.
pub async fn oauth_callback<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    P: OAuthProvider + Send + Sync + 'static,
{
    let cookie_config = state.oauth_cookie();
    let cookie_value = extract_cookie(&headers, OAUTH_COOKIE_NAME);

    let result = match (query.error, query.code, query.state) {
        (Some(error), _, _) => {
            tracing::info!(error = %error, "OAuth consent not granted");
            Err("OAUTH_DENIED")
        }
        (None, Some(code), Some(oauth_state)) => {
            match complete_oauth(&state, &code, &oauth_state, cookie_value.as_deref()).await {
                Ok(tokens) => Ok(tokens),
                Err(e) => {
                    e.log();
                    Err(e.code())
                }
            }
        }
        _ => Err("OAUTH_STATE_MISMATCH"),
    };

    let params: Vec<(&str, String)> = match result {
        Ok(tokens) => vec![
            ("access_token", tokens.access_token),
            ("refresh_token", tokens.refresh_token),
            ("token_type", tokens.token_type),
        ],
        Err(code) => vec![("error", code.to_string())],
    };

    let target = Url::parse_with_params(&state.config.oauth_success_url(), &params)
        .map(String::from)
        .unwrap_or_else(|_| state.config.frontend_url.clone());

    let mut response = Redirect::to(&target).into_response();
    if let Some(delete) = delete_cookie_header(&cookie_config) {
        response.headers_mut().insert(header::SET_COOKIE, delete);
    }
    response
}

async fn complete_oauth<U, V, P>(
    state: &AuthAppState<U, V, P>,
    code: &str,
    oauth_state: &str,
    cookie_value: Option<&str>,
) -> AuthResult<TokenResponse>
where
    U: UserRepository + Send + Sync + 'static,
    P: OAuthProvider + Send + Sync + 'static,
{
    let use_case = OAuthLoginUseCase::new(
        state.users.clone(),
        oauth_provider(state)?,
        state.codec.clone(),
        state.config.clone(),
    );
    let pair = use_case.complete(code, oauth_state, cookie_value).await?;
    Ok(pair.into())
}

// ============================================================================
// Admin: users
// ============================================================================

/// GET /api/admin/users
pub async fn list_users<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Query(query): Query<ListUsersQuery>,
) -> AuthResult<Json<UserListResponse>>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = AdminUsersUseCase::new(state.users.clone(), state.config.clone());
    let page = PageRequest::new(query.page, query.limit);

    let result = use_case.list(query.search.as_deref(), page).await?;

    Ok(Json(UserListResponse {
        data: result.users.iter().map(UserResponse::from).collect(),
        total_count: result.total_count,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(result.total_count),
    }))
}

/// POST /api/admin/users
pub async fn create_user<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Json(req): Json<CreateUserRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = AdminUsersUseCase::new(state.users.clone(), state.config.clone());

    let user = use_case
        .create(CreateUserInput {
            email: req.email,
            password: req.password,
            profile: UserProfile {
                nama: req.nama,
                telepon: req.telepon,
                alamat: req.alamat,
            },
            is_admin: req.is_admin,
            is_active: req.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PATCH /api/admin/users/{id}
pub async fn update_user<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> AuthResult<Json<UserResponse>>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = AdminUsersUseCase::new(state.users.clone(), state.config.clone());

    let user = use_case
        .update(
            &actor,
            UserId::from_uuid(id),
            UpdateUserInput {
                is_admin: req.is_admin,
                is_active: req.is_active,
                is_verified: req.is_verified,
                nama: req.nama,
                telepon: req.telepon,
                alamat: req.alamat,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user<U, V, P>(
    State(state): State<AuthAppState<U, V, P>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AuthResult<Json<MessageResponse>>
where
    U: UserRepository + Send + Sync + 'static,
{
    let use_case = AdminUsersUseCase::new(state.users.clone(), state.config.clone());

    use_case.delete(&actor, UserId::from_uuid(id)).await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

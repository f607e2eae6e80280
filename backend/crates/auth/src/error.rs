//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Every variant carries a stable
//! machine-readable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request body failed validation; one entry per offending field
    #[error("Validation failed")]
    Validation(Vec<(&'static str, String)>),

    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password; the two are indistinguishable
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Inactive user")]
    UserInactive,

    #[error("Not authenticated")]
    MissingToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Could not validate credentials")]
    TokenInvalid,

    #[error("Token type mismatch")]
    TokenTypeMismatch,

    /// Access token subject is not a user id
    #[error("Invalid token payload")]
    InvalidTokenPayload,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid refresh token payload")]
    InvalidRefreshPayload,

    #[error("Refresh token has already been used")]
    RefreshTokenRevoked,

    #[error("User is inactive or does not exist")]
    InactiveOrNonexistentUser,

    #[error("Administrator privileges required")]
    AdminRequired,

    #[error("Administrators cannot remove their own admin status")]
    CannotDemoteSelf,

    #[error("Administrators cannot delete their own account")]
    CannotDeleteSelf,

    #[error("OAuth state mismatch")]
    OAuthStateMismatch,

    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    #[error("OAuth login is not configured")]
    OAuthNotConfigured,

    /// Transient store failures persisted through every retry
    #[error("Database temporarily unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidCredentials
            | AuthError::UserInactive
            | AuthError::CannotDemoteSelf
            | AuthError::CannotDeleteSelf
            | AuthError::OAuthStateMismatch => ErrorKind::BadRequest,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::TokenTypeMismatch
            | AuthError::InvalidTokenPayload
            | AuthError::InvalidRefreshPayload
            | AuthError::RefreshTokenRevoked
            | AuthError::InactiveOrNonexistentUser => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::AdminRequired => ErrorKind::Forbidden,
            AuthError::OAuthProvider(_)
            | AuthError::OAuthNotConfigured
            | AuthError::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            AuthError::Database(e) if kernel::error::is_transient_db_error(e) => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::EmailTaken => "EMAIL_TAKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserInactive => "USER_INACTIVE",
            AuthError::MissingToken => "NOT_AUTHENTICATED",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::TokenTypeMismatch => "TOKEN_TYPE_MISMATCH",
            AuthError::InvalidTokenPayload => "INVALID_TOKEN_PAYLOAD",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::InvalidRefreshPayload => "INVALID_REFRESH_PAYLOAD",
            AuthError::RefreshTokenRevoked => "REFRESH_TOKEN_REVOKED",
            AuthError::InactiveOrNonexistentUser => "INACTIVE_OR_NONEXISTENT_USER",
            AuthError::AdminRequired => "ADMIN_REQUIRED",
            AuthError::CannotDemoteSelf => "CANNOT_DEMOTE_SELF",
            AuthError::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            AuthError::OAuthStateMismatch => "OAUTH_STATE_MISMATCH",
            AuthError::OAuthProvider(_) => "OAUTH_PROVIDER_ERROR",
            AuthError::OAuthNotConfigured => "OAUTH_NOT_CONFIGURED",
            AuthError::ServiceUnavailable => "DATABASE_CONNECTION_ERROR",
            AuthError::Database(e) if kernel::error::is_transient_db_error(e) => {
                "DATABASE_CONNECTION_ERROR"
            }
            AuthError::Database(_) => "DATABASE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the data store may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Database(e) if kernel::error::is_transient_db_error(e))
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            // Never leak driver or internal details
            AuthError::Database(_) | AuthError::Internal(_) | AuthError::OAuthProvider(_) => {
                self.kind().as_str().to_string()
            }
            _ => self.to_string(),
        };
        let mut err = AppError::new(self.kind(), message).with_code(self.code());
        if let AuthError::Validation(fields) = self {
            for (field, msg) in fields {
                err = err.with_field_error(*field, msg.clone());
            }
        }
        if self.kind() == ErrorKind::ServiceUnavailable {
            err = err.with_action("Please try again later");
        }
        err
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::OAuthProvider(msg) => {
                tracing::error!(message = %msg, "OAuth provider error");
            }
            AuthError::ServiceUnavailable => {
                tracing::error!("Auth store unavailable after retries");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenRevoked => {
                tracing::warn!("Replay of a consumed refresh token");
            }
            AuthError::OAuthStateMismatch => {
                tracing::warn!("OAuth callback with mismatched state");
            }
            AuthError::AdminRequired => {
                tracing::warn!("Non-admin access to admin route");
            }
            _ => {
                tracing::debug!(error = %self, code = self.code(), "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::retry::RetryError<AuthError>> for AuthError {
    fn from(err: platform::retry::RetryError<AuthError>) -> Self {
        use platform::retry::RetryError;
        match err {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { .. } | RetryError::Cancelled => AuthError::ServiceUnavailable,
        }
    }
}

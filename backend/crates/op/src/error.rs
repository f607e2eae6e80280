//! Tax-object Errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kernel::error::{AppError, ErrorKind};
use thiserror::Error;

pub type OpResult<T> = Result<T, OpError>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("NOP must be exactly 18 digits")]
    InvalidNop,

    #[error("Validation failed")]
    Validation(Vec<(&'static str, String)>),

    /// The object exists but is linked to another taxpayer identity
    #[error("You do not have access to this tax object")]
    ObjectForbidden,

    #[error("Tax object not found")]
    ObjectNotFound,

    #[error("SPPT not found")]
    SpptNotFound,

    #[error("Parcel not found")]
    ParcelNotFound,

    /// Taxpayer identity already bound to a different account
    #[error("This taxpayer identity has already been claimed by another account")]
    ClaimConflict,

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpError::InvalidNop | OpError::Validation(_) => ErrorKind::BadRequest,
            OpError::ObjectForbidden => ErrorKind::Forbidden,
            OpError::ObjectNotFound | OpError::SpptNotFound | OpError::ParcelNotFound => {
                ErrorKind::NotFound
            }
            OpError::ClaimConflict => ErrorKind::Conflict,
            OpError::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            OpError::Database(e) if kernel::error::is_transient_db_error(e) => {
                ErrorKind::ServiceUnavailable
            }
            OpError::Database(_) | OpError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            OpError::InvalidNop => "INVALID_NOP",
            OpError::Validation(_) => "VALIDATION_ERROR",
            OpError::ObjectForbidden => "OBJECT_FORBIDDEN",
            OpError::ObjectNotFound => "OBJECT_NOT_FOUND",
            OpError::SpptNotFound => "SPPT_NOT_FOUND",
            OpError::ParcelNotFound => "PARCEL_NOT_FOUND",
            OpError::ClaimConflict => "CLAIM_CONFLICT",
            OpError::ServiceUnavailable => "DATABASE_CONNECTION_ERROR",
            OpError::Database(e) if kernel::error::is_transient_db_error(e) => {
                "DATABASE_CONNECTION_ERROR"
            }
            OpError::Database(_) => "DATABASE_ERROR",
            OpError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, OpError::Database(e) if kernel::error::is_transient_db_error(e))
    }

    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            OpError::Database(_) | OpError::Internal(_) => self.kind().as_str().to_string(),
            _ => self.to_string(),
        };
        let mut err = AppError::new(self.kind(), message).with_code(self.code());
        if let OpError::Validation(fields) = self {
            for (field, msg) in fields {
                err = err.with_field_error(*field, msg.clone());
            }
        }
        if self.kind() == ErrorKind::ServiceUnavailable {
            err = err.with_action("Please try again later");
        }
        err
    }

    fn log(&self) {
        match self {
            OpError::Database(e) => tracing::error!(error = %e, "Tax-object database error"),
            OpError::Internal(msg) => tracing::error!(message = %msg, "Tax-object internal error"),
            OpError::ServiceUnavailable => {
                tracing::error!("Tax-object store unavailable after retries")
            }
            OpError::ObjectForbidden => tracing::warn!("Access to a tax object owned by another"),
            OpError::ClaimConflict => tracing::warn!("Claim of an already bound taxpayer"),
            _ => tracing::debug!(error = %self, code = self.code(), "Tax-object error"),
        }
    }
}

impl IntoResponse for OpError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::retry::RetryError<OpError>> for OpError {
    fn from(err: platform::retry::RetryError<OpError>) -> Self {
        use platform::retry::RetryError;
        match err {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { .. } | RetryError::Cancelled => OpError::ServiceUnavailable,
        }
    }
}

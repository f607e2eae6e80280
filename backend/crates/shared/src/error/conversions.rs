//! Error conversions - From implementations for common error types
//!
//! `sqlx::Error` to [`AppError`], the transient-failure classification
//! shared by the retry wrapper, and the RFC 7807 response body.

use super::app_error::AppError;
#[cfg(test)]
use super::kind::ErrorKind;

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// PostgreSQL SQLSTATE が一時的障害（再試行対象）かどうか
///
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
/// * Class 08 — Connection Exception
/// * Class 53 — Insufficient Resources
/// * Class 57 — Operator Intervention (57014 query_canceled を除く)
pub fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || matches!(code, "57000" | "57P01" | "57P02" | "57P03")
}

/// 一時的なデータストア障害かどうか
///
/// `true` を返すエラーは `From<sqlx::Error>` で 503 に変換されるものと一致します。
#[cfg(feature = "sqlx")]
pub fn is_transient_db_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_transient_sqlstate(code.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient_db_error(&err) {
            return AppError::service_unavailable("Database temporarily unavailable")
                .with_code("DATABASE_CONNECTION_ERROR")
                .with_action("Please try again later")
                .with_source(err);
        }
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found").with_source(err),
            sqlx::Error::Database(db_err) => {
                let app_err = match db_err.code().as_deref() {
                    // Class 23 — Integrity Constraint Violation
                    Some("23000") => AppError::conflict("Integrity constraint violation"),
                    Some("23502") => AppError::bad_request("Required field is null"),
                    Some("23503") => AppError::conflict("Foreign key violation"),
                    Some("23505") => AppError::conflict("Duplicate key value"),
                    Some("23514") => AppError::bad_request("Check constraint violation"),
                    // Class 42 — Syntax Error or Access Rule Violation
                    Some("42501") => AppError::forbidden("Insufficient privilege"),
                    _ => AppError::internal("Database error"),
                };
                app_err.with_source(err)
            }
            _ => AppError::internal("Database error").with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let mut body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "code": self.code(),
            "action": self.action(),
        });
        if !self.field_errors().is_empty() {
            body["errors"] = serde_json::json!(self.field_errors());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_sqlstate_classes() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("53300"));
        assert!(is_transient_sqlstate("57P01"));
        assert!(!is_transient_sqlstate("57014"));
        assert!(!is_transient_sqlstate("23505"));
        assert!(!is_transient_sqlstate("42P01"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_timeout_is_transient_and_unavailable() {
        assert!(is_transient_db_error(&sqlx::Error::PoolTimedOut));
        let app_err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(app_err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(app_err.code(), "DATABASE_CONNECTION_ERROR");
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_row_not_found_is_permanent() {
        assert!(!is_transient_db_error(&sqlx::Error::RowNotFound));
        let app_err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(app_err.kind(), ErrorKind::NotFound);
    }
}

//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::{RevocationStore, UserPage, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    id,
    email,
    password_hash,
    nama,
    telepon,
    alamat,
    is_active,
    is_verified,
    is_admin,
    created_at,
    updated_at
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                email,
                password_hash,
                nama,
                telepon,
                alamat,
                is_active,
                is_verified,
                is_admin,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(&user.nama)
        .bind(&user.telepon)
        .bind(&user.alamat)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::EmailTaken,
            _ => AuthError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                nama = $2,
                telepon = $3,
                alamat = $4,
                is_active = $5,
                is_verified = $6,
                is_admin = $7,
                password_hash = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.nama)
        .bind(&user.telepon)
        .bind(&user.alamat)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_admin)
        .bind(user.password_hash.as_phc_string())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list(&self, search: Option<&str>, offset: i64, limit: i64) -> AuthResult<UserPage> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));

        let total_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE $1::text IS NULL OR email ILIKE $1 OR nama ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE $1::text IS NULL OR email ILIKE $1 OR nama ILIKE $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(&pattern)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserPage {
            users: rows.into_iter().map(UserRow::into_user).collect(),
            total_count,
        })
    }
}

/// Escape LIKE wildcards in user input (default escape character `\`)
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// Revocation Store Implementation
// ============================================================================

/// PostgreSQL-backed revocation registry, shared by every API process
#[derive(Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RevocationStore for PgRevocationStore {
    async fn try_revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
        claim: Uuid,
    ) -> AuthResult<bool> {
        // The primary key arbitrates concurrent inserts. An entry left by an
        // earlier attempt of the same claim still counts as ours.
        let owned: bool = sqlx::query_scalar(
            r#"
            WITH inserted AS (
                INSERT INTO revoked_refresh_tokens (jti, claim_id, expires_at, revoked_at)
                VALUES ($1, $3, $2, now())
                ON CONFLICT (jti) DO NOTHING
                RETURNING jti
            )
            SELECT EXISTS(SELECT 1 FROM inserted)
                OR EXISTS(
                    SELECT 1 FROM revoked_refresh_tokens
                    WHERE jti = $1 AND claim_id = $3
                )
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .bind(claim)
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }

    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_refresh_tokens (jti, expires_at, revoked_at)
            VALUES ($1, $2, now())
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM revoked_refresh_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM revoked_refresh_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(entries_deleted = deleted, "Purged expired refresh token revocations");

        Ok(deleted)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    nama: Option<String>,
    telepon: Option<String>,
    alamat: Option<String>,
    is_active: bool,
    is_verified: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.id),
            email: Email::from_db(self.email),
            password_hash: HashedPassword::from_stored(self.password_hash),
            nama: self.nama,
            telepon: self.telepon,
            alamat: self.alamat,
            is_active: self.is_active,
            is_verified: self.is_verified,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("budi"), "budi");
    }
}

//! Token Codec
//!
//! Signed, typed, expiring bearer tokens (HS256). Access and refresh tokens
//! are signed with distinct secrets and carry a `token_type` tag that is
//! checked against the verification context.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

pub const TOKEN_ISSUER: &str = "app";
pub const TOKEN_AUDIENCE: &str = "app-api";

/// Token type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token claims
///
/// Unknown `token_type` values and missing fields fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
    pub iss: String,
    pub aud: String,
}

/// Access + refresh token pair returned by login, refresh and OAuth
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Encodes and verifies tokens
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = 0;

        Self {
            access: SigningKeys::new(access_secret, access_ttl),
            refresh: SigningKeys::new(refresh_secret, refresh_ttl),
            validation,
        }
    }

    fn keys(&self, token_type: TokenType) -> &SigningKeys {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    /// Issue a token for `subject` with a fresh `jti`
    pub fn issue(&self, subject: &str, token_type: TokenType) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.keys(token_type).ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
            token_type,
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };
        self.sign(&claims)
    }

    /// Issue an access + refresh pair for `subject`
    pub fn issue_pair(&self, subject: &str) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenType::Access)?,
            refresh_token: self.issue(subject, TokenType::Refresh)?,
        })
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.token_type).encoding,
        )
        .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Verify `token` in the context of `expected` type
    pub fn verify(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        let data = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;
        let claims = data.claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        if claims.token_type != expected {
            return Err(AuthError::TokenTypeMismatch);
        }

        Ok(claims)
    }
}

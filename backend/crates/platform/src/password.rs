//! Password Hashing and Verification
//!
//! - Argon2id hashing with a fresh random salt per digest (PHC string format)
//! - Tunable cost parameters
//! - Zeroization of clear text
//! - Registration policy: minimum length and at least one digit
//!
//! Verification never errors: a malformed or foreign digest simply fails to match.

use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Cost parameters
// ============================================================================

/// Argon2id cost parameters
///
/// The defaults follow the OWASP baseline (m=19 MiB, t=2, p=1).
/// Digests carry their own parameters, so changing these only affects new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordParams {
    /// Minimal cost for development and tests
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 1_024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, PasswordHashError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Not `Clone`; debug output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a password for a new credential, enforcing the registration policy
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if !normalized.chars().any(|ch| ch.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingDigit);
        }

        Ok(Self(normalized))
    }

    /// Wrap a password presented at login
    ///
    /// No policy is applied: stored credentials may predate the current policy.
    pub fn for_verification(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password using Argon2id with a fresh salt
    pub fn hash(&self, params: &PasswordParams) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = params
            .hasher()?
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from a PHC string, rejecting anything that does not parse
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Wrap a stored digest without validation
    ///
    /// Used for rows loaded from the database; a corrupt digest then fails `verify`.
    pub fn from_stored(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash (constant-time)
    ///
    /// Returns `false` for a malformed digest.
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        // Cost parameters are read from the digest itself
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Whether the digest was produced with parameters other than `params`
    pub fn needs_rehash(&self, params: &PasswordParams) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return true;
        };
        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        match Params::try_from(&parsed_hash) {
            Ok(stored) => {
                stored.m_cost() != params.memory_kib
                    || stored.t_cost() != params.iterations
                    || stored.p_cost() != params.parallelism
            }
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Async helpers
// ============================================================================

/// Hash on the blocking thread pool
///
/// Argon2 is deliberately slow and must not stall the async executor.
pub async fn hash_blocking(
    password: ClearTextPassword,
    params: PasswordParams,
) -> Result<HashedPassword, PasswordHashError> {
    tokio::task::spawn_blocking(move || password.hash(&params))
        .await
        .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
}

/// Outcome of a login-time verification
#[derive(Debug)]
pub enum Verification {
    Mismatch,
    Match,
    /// Matched a digest made with other cost parameters; carries the replacement
    Outdated(HashedPassword),
}

/// Verify on the blocking thread pool, rehashing under `params` when the
/// stored digest is outdated
pub async fn verify_blocking(
    password: ClearTextPassword,
    hashed: HashedPassword,
    params: PasswordParams,
) -> Result<Verification, PasswordHashError> {
    tokio::task::spawn_blocking(move || {
        if !hashed.verify(&password) {
            return Ok(Verification::Mismatch);
        }
        if !hashed.needs_rehash(&params) {
            return Ok(Verification::Match);
        }
        password.hash(&params).map(Verification::Outdated)
    })
    .await
    .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
}

/// Digest of a random secret under `params`, computed once per parameter set
///
/// Nothing verifies against it; checking a password for an unknown account
/// against it costs the same Argon2 work as a wrong password.
pub fn dummy_digest(params: &PasswordParams) -> Result<HashedPassword, PasswordHashError> {
    static DIGESTS: OnceLock<Mutex<Vec<(PasswordParams, HashedPassword)>>> = OnceLock::new();
    let digests = DIGESTS.get_or_init(Default::default);

    let cached = digests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|(p, _)| p == params)
        .map(|(_, digest)| digest.clone());
    if let Some(digest) = cached {
        return Ok(digest);
    }

    let secret = SaltString::generate(&mut OsRng);
    let digest = ClearTextPassword(secret.as_str().to_string()).hash(params)?;
    digests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((*params, digest.clone()));
    Ok(digest)
}

/// Spend one verification's worth of work for an account that does not exist
pub async fn verify_dummy_blocking(
    password: ClearTextPassword,
    params: PasswordParams,
) -> Result<(), PasswordHashError> {
    tokio::task::spawn_blocking(move || {
        dummy_digest(&params)?.verify(&password);
        Ok(())
    })
    .await
    .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
}

// ============================================================================
// Tests
// ============================================================================

//! User Entity
//!
//! An account of a taxpayer or administrator. The normalized email is the
//! join key to taxpayer identity records.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, user_id::UserId};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, normalized
    pub email: Email,
    pub password_hash: HashedPassword,
    pub nama: Option<String>,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
    pub is_active: bool,
    /// Set once a taxpayer identity claim succeeds
    pub is_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional profile fields supplied at registration or admin creation
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub nama: Option<String>,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
}

impl User {
    /// Create a new account: active, unverified, non-admin
    pub fn new(email: Email, password_hash: HashedPassword, profile: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            password_hash,
            nama: profile.nama,
            telepon: profile.telepon,
            alamat: profile.alamat,
            is_active: true,
            is_verified: false,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.updated_at = Utc::now();
    }

    pub fn set_admin(&mut self, admin: bool) {
        self.is_admin = admin;
        self.updated_at = Utc::now();
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.is_verified = verified;
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

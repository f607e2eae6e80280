//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::password::PasswordParams;
use platform::retry::RetryPolicy;

/// Google OAuth client settings
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI registered with Google
    pub redirect_uri: String,
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for access tokens
    pub access_secret: Vec<u8>,
    /// HS256 secret for refresh tokens; must differ from `access_secret`
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime (25 hours)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    /// Argon2id cost for new password hashes
    pub password_params: PasswordParams,
    /// Retry policy for user and revocation store calls
    pub store_retry: RetryPolicy,
    /// Frontend base URL that receives OAuth results
    pub frontend_url: String,
    pub google: Option<GoogleOAuthConfig>,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: Vec::new(),
            refresh_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(1500 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            password_params: PasswordParams::default(),
            store_retry: RetryPolicy::default(),
            frontend_url: "http://localhost:3000".to_string(),
            google: None,
            cookie_secure: true,
        }
    }
}

impl AuthConfig {
    /// Create config with random token secrets
    pub fn with_random_secrets() -> Self {
        Self {
            access_secret: platform::crypto::random_bytes(32),
            refresh_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, cheap hashing)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            password_params: PasswordParams::low_cost(),
            ..Self::with_random_secrets()
        }
    }

    /// Secrets present and distinct
    pub fn secrets_are_valid(&self) -> bool {
        !self.access_secret.is_empty()
            && !self.refresh_secret.is_empty()
            && self.access_secret != self.refresh_secret
    }

    /// Where the OAuth callback sends the browser with the issued pair
    pub fn oauth_success_url(&self) -> String {
        format!(
            "{}/auth/oauth/google/callback",
            self.frontend_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.access_token_ttl, Duration::from_secs(90_000));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(604_800));
        assert_eq!(config.store_retry.max_attempts, 3);
        assert!(!config.secrets_are_valid());
    }

    #[test]
    fn test_random_secrets_are_distinct() {
        assert!(AuthConfig::development().secrets_are_valid());
    }

    #[test]
    fn test_oauth_success_url_strips_trailing_slash() {
        let config = AuthConfig {
            frontend_url: "https://pbb.example.go.id/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.oauth_success_url(),
            "https://pbb.example.go.id/auth/oauth/google/callback"
        );
    }
}

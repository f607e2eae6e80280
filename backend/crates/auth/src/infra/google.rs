//! Google OAuth 2.0 client

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::application::config::GoogleOAuthConfig;
use crate::domain::repository::{OAuthIdentity, OAuthProvider};
use crate::error::{AuthError, AuthResult};

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Internal(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { http, config })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

fn provider_error(context: &str, err: impl std::fmt::Display) -> AuthError {
    AuthError::OAuthProvider(format!("{}: {}", context, err))
}

impl OAuthProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> AuthResult<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_ENDPOINT,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    async fn fetch_identity(&self, code: &str, code_verifier: &str) -> AuthResult<OAuthIdentity> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| provider_error("token exchange", e))?
            .error_for_status()
            .map_err(|e| provider_error("token exchange", e))?
            .json()
            .await
            .map_err(|e| provider_error("token response", e))?;

        let info: UserInfo = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| provider_error("userinfo", e))?
            .error_for_status()
            .map_err(|e| provider_error("userinfo", e))?
            .json()
            .await
            .map_err(|e| provider_error("userinfo response", e))?;

        match info.email {
            Some(email) if info.email_verified => Ok(OAuthIdentity {
                email,
                name: info.name,
            }),
            _ => Err(AuthError::OAuthProvider(
                "account has no verified email".to_string(),
            )),
        }
    }
}

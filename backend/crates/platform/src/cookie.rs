//! Cookie Management Infrastructure
//!
//! Short-lived HttpOnly cookies carrying OAuth round-trip state.

use axum::http::{HeaderMap, HeaderValue, header};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl CookieConfig {
    /// HttpOnly cookie scoped to `path`, `SameSite=Lax` so it survives the
    /// top-level redirect back from an identity provider
    pub fn oauth(name: impl Into<String>, path: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
            same_site: SameSite::Lax,
            path: path.into(),
            max_age_secs: Some(600),
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, value);

        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        format!("{}=; HttpOnly; Path={}; Max-Age=0", self.name, self.path)
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// Set-Cookie header value, `None` if the value contains invalid header bytes
pub fn set_cookie_header(config: &CookieConfig, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_set_cookie(value)).ok()
}

/// Set-Cookie header value expiring the cookie
pub fn delete_cookie_header(config: &CookieConfig) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_delete_cookie()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_cookie_build() {
        let config = CookieConfig::oauth("oauth_state", "/api/auth/oauth", true);

        let cookie = config.build_set_cookie("value123");
        assert!(cookie.starts_with("oauth_state=value123; HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/api/auth/oauth"));
        assert!(cookie.contains("Max-Age=600"));
    }

    #[test]
    fn test_delete_cookie() {
        let config = CookieConfig::oauth("oauth_state", "/", false);
        assert_eq!(
            config.build_delete_cookie(),
            "oauth_state=; HttpOnly; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("foo=bar; a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("oauth_state=abc123"));

        assert_eq!(
            extract_cookie(&headers, "oauth_state"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }
}

//! Email Value Object
//!
//! Stored trimmed and lower-cased. The normalized form is the join key to
//! `dat_subjek_pajak.email_wp`, so two spellings of one address must never
//! produce two accounts.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// RFC 5321 path limit
const MAX_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Email cannot be empty")]
    Empty,

    #[error("Email must be at most {MAX_LEN} characters")]
    TooLong,

    #[error("Invalid email format")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmailError> {
        let email = raw.as_ref().trim().to_lowercase();
        if email.is_empty() {
            return Err(EmailError::Empty);
        }
        if email.len() > MAX_LEN {
            return Err(EmailError::TooLong);
        }

        let (local, domain) = email.split_once('@').ok_or(EmailError::Malformed)?;
        let local_ok = !local.is_empty()
            && local.len() <= MAX_LOCAL_LEN
            && !local.chars().any(|c| c.is_whitespace() || c == '@');
        if !local_ok || !is_hostname(domain) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(email))
    }

    /// Wrap a value read back from `users.email`
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// At least two dot-separated labels of ASCII alphanumerics and inner hyphens
fn is_hostname(domain: &str) -> bool {
    let mut labels = 0;
    for label in domain.split('.') {
        let valid = !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return false;
        }
        labels += 1;
    }
    labels >= 2
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        let email = Email::new("  Alice@Example.COM \n").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
        assert_eq!(email, "alice@example.com".parse().unwrap());
        assert!(Email::new("wayan.sudarsana+pbb@badungkab.go.id").is_ok());
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert_eq!(Email::new("   "), Err(EmailError::Empty));
        for raw in [
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@-example.com",
            "user@example..com",
            "us er@example.com",
        ] {
            assert_eq!(Email::new(raw), Err(EmailError::Malformed), "{}", raw);
        }
    }

    #[test]
    fn test_email_length_limits() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::new(long), Err(EmailError::TooLong));
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(Email::new(long_local), Err(EmailError::Malformed));
    }
}

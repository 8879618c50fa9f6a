//! Single-operator admin authentication: one shared password, one opaque
//! session token.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const TOKEN_CONTEXT: &str = "tsunagu-admin-session:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("admin login is disabled because no password is configured")]
    Disabled,
    #[error("invalid password")]
    InvalidPassword,
}

#[derive(Clone)]
pub struct AdminAuthService {
    password_hash: Option<Vec<u8>>,
    session_token: Option<String>,
}

impl AdminAuthService {
    /// `session_secret` falls back to the password when absent, so the
    /// session token changes whenever either value changes.
    pub fn new(admin_password: Option<&str>, session_secret: Option<&str>) -> Self {
        let password = admin_password.filter(|value| !value.is_empty());
        let password_hash = password.map(hash_secret);
        let session_token = password.map(|password| {
            let secret = session_secret
                .filter(|value| !value.is_empty())
                .unwrap_or(password);
            hex::encode(hash_secret(&format!("{TOKEN_CONTEXT}{secret}")))
        });

        Self {
            password_hash,
            session_token,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check the submitted password and hand back the session token.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        let (Some(expected), Some(token)) = (&self.password_hash, &self.session_token) else {
            return Err(AuthError::Disabled);
        };

        let candidate = hash_secret(password);
        if expected.ct_eq(&candidate).unwrap_u8() == 0 {
            return Err(AuthError::InvalidPassword);
        }
        Ok(token.clone())
    }

    pub fn verify_session(&self, presented: &str) -> bool {
        match &self.session_token {
            Some(token) => token.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() == 1,
            None => false,
        }
    }
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_yields_verifiable_token() {
        let auth = AdminAuthService::new(Some("hunter2"), Some("secret"));
        let token = auth.login("hunter2").expect("login");
        assert_eq!(token.len(), 64);
        assert!(auth.verify_session(&token));
        assert!(!auth.verify_session("hunter2"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth = AdminAuthService::new(Some("hunter2"), None);
        assert_eq!(auth.login("hunter3"), Err(AuthError::InvalidPassword));
    }

    #[test]
    fn missing_password_disables_login() {
        let auth = AdminAuthService::new(None, Some("secret"));
        assert!(!auth.is_enabled());
        assert_eq!(auth.login(""), Err(AuthError::Disabled));
        assert!(!auth.verify_session(""));
    }

    #[test]
    fn rotating_the_secret_invalidates_sessions() {
        let before = AdminAuthService::new(Some("pw"), Some("one"));
        let after = AdminAuthService::new(Some("pw"), Some("two"));
        let token = before.login("pw").expect("login");
        assert!(!after.verify_session(&token));
    }
}

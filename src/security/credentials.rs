//! Deposit credentials with memory-safe handling and masking
//!
//! This module resolves user-supplied credentials against a deposit
//! point's stored credentials, using the `secrecy` crate to prevent
//! accidental exposure in logs or memory dumps.

use crate::core::traits::{DepositPoint, ResolvedCredentials};
use secrecy::{ExposeSecret, SecretString};

/// Reserved password value meaning "use the deposit point's stored
/// password". Must never reach the wire: resolution substitutes the stored
/// credential before the deposit client is invoked.
pub const STORED_PASSWORD_SENTINEL: &str = "<use-stored-password>";

/// Credentials as supplied by the invoking surface (form, CLI flags).
///
/// Any field may be absent or carry the sentinel; `resolve` produces the
/// wire-ready form.
#[derive(Debug, Clone, Default)]
pub struct DepositCredentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

impl DepositCredentials {
    pub fn new(
        username: Option<String>,
        password: Option<SecretString>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            username,
            password,
            api_key,
        }
    }

    /// Resolve against a deposit point's stored credentials.
    ///
    /// An explicit non-sentinel value always wins; the sentinel or an
    /// absent field falls back to what the deposit point stores.
    pub fn resolve(&self, deposit_point: &DepositPoint) -> ResolvedCredentials {
        let username = match &self.username {
            Some(u) if !u.is_empty() => Some(u.clone()),
            _ => deposit_point.username.clone(),
        };

        let password = match &self.password {
            Some(p) if p.expose_secret() == STORED_PASSWORD_SENTINEL => {
                deposit_point.password.clone()
            }
            Some(p) => Some(p.clone()),
            None => deposit_point.password.clone(),
        };

        let api_key = match &self.api_key {
            Some(k) => Some(k.clone()),
            None => deposit_point.api_key.clone(),
        };

        ResolvedCredentials {
            username,
            password,
            api_key,
        }
    }
}

/// Masks a secret for safe logging.
///
/// Shows only the first 3 and last 3 characters for identification;
/// secrets shorter than 10 characters are fully masked as "****".
///
/// # Examples
///
/// ```
/// use sword_depositor::security::mask_secret;
///
/// assert_eq!(mask_secret("abcdef123456"), "abc...456");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    if secret.len() < 10 {
        return "****".to_string();
    }

    format!("{}...{}", &secret[..3], &secret[secret.len() - 3..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::DepositPointKind;

    fn point_with_stored_credentials() -> DepositPoint {
        DepositPoint {
            id: 1,
            context_id: 1,
            name: "Institutional Repository".to_string(),
            url: "https://repo.example.edu/sword/collection/7".to_string(),
            username: Some("stored-user".to_string()),
            password: Some(SecretString::new("stored-pass".into())),
            api_key: Some(SecretString::new("stored-key".into())),
            kind: DepositPointKind::Manager,
        }
    }

    #[test]
    fn test_sentinel_substitutes_stored_password() {
        let credentials = DepositCredentials::new(
            Some("alice".to_string()),
            Some(SecretString::new(STORED_PASSWORD_SENTINEL.into())),
            None,
        );

        let resolved = credentials.resolve(&point_with_stored_credentials());

        assert_eq!(
            resolved.password.as_ref().unwrap().expose_secret(),
            "stored-pass"
        );
        // the sentinel literal never survives resolution
        assert_ne!(
            resolved.password.as_ref().unwrap().expose_secret(),
            STORED_PASSWORD_SENTINEL
        );
    }

    #[test]
    fn test_explicit_password_wins() {
        let credentials = DepositCredentials::new(
            None,
            Some(SecretString::new("typed-pass".into())),
            None,
        );

        let resolved = credentials.resolve(&point_with_stored_credentials());

        assert_eq!(
            resolved.password.as_ref().unwrap().expose_secret(),
            "typed-pass"
        );
    }

    #[test]
    fn test_absent_fields_fall_back_to_stored() {
        let credentials = DepositCredentials::default();

        let resolved = credentials.resolve(&point_with_stored_credentials());

        assert_eq!(resolved.username.as_deref(), Some("stored-user"));
        assert_eq!(
            resolved.password.as_ref().unwrap().expose_secret(),
            "stored-pass"
        );
        assert_eq!(
            resolved.api_key.as_ref().unwrap().expose_secret(),
            "stored-key"
        );
    }

    #[test]
    fn test_sentinel_with_no_stored_password_resolves_to_none() {
        let mut point = point_with_stored_credentials();
        point.password = None;

        let credentials = DepositCredentials::new(
            None,
            Some(SecretString::new(STORED_PASSWORD_SENTINEL.into())),
            None,
        );

        assert!(credentials.resolve(&point).password.is_none());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdef123456"), "abc...456");
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret(""), "****");
    }
}

//! Authentication service
//!
//! Sign-in flows of the login screen on top of `AppStore::login`. The
//! biometric prompt itself lives in the platform layer; only its pass/fail
//! outcome reaches this service.

use super::credentials::{CredentialStore, StoredCredentials};
use crate::error::{AppError, Result};
use crate::store::{AppStore, User};

pub struct AuthService<C: CredentialStore> {
    credentials: C,
}

impl<C: CredentialStore> AuthService<C> {
    pub fn new(credentials: C) -> Self {
        Self { credentials }
    }

    /// Email/password sign-in; optionally remembers the pair for
    /// biometric unlock. Failing to remember does not fail the sign-in.
    pub fn sign_in(
        &self,
        store: &mut AppStore,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<User> {
        let user = store.login(email, password)?;

        if remember {
            let credentials = StoredCredentials {
                email: user.email.clone(),
                password: password.to_string(),
            };
            if let Err(e) = self.credentials.remember(&credentials) {
                tracing::warn!("Could not remember credentials: {}", e);
            }
        }

        Ok(user)
    }

    /// Sign in with the remembered credentials once the biometric prompt
    /// has reported `passed`.
    pub fn sign_in_with_biometrics(&self, store: &mut AppStore, passed: bool) -> Result<User> {
        if !passed {
            tracing::info!("Biometric authentication was not successful");
            return Err(AppError::Auth("Biometric authentication failed".to_string()));
        }

        let Some(credentials) = self.credentials.recall()? else {
            return Err(AppError::Auth(
                "No saved credentials; sign in with email and password first".to_string(),
            ));
        };

        store.login(&credentials.email, &credentials.password)
    }

    /// Sign out, optionally dropping the remembered credentials
    pub fn sign_out(&self, store: &mut AppStore, forget: bool) -> Result<()> {
        store.logout();
        if forget {
            self.credentials.forget()?;
        }
        Ok(())
    }

    pub fn has_remembered_credentials(&self) -> bool {
        matches!(self.credentials.recall(), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::MemoryCredentials;

    #[test]
    fn test_biometric_sign_in_uses_remembered_credentials() {
        let credentials = MemoryCredentials::new();
        let auth = AuthService::new(credentials.clone());
        let mut store = AppStore::in_memory();

        auth.sign_in(&mut store, "me@example.com", "pw", true).unwrap();
        assert!(auth.has_remembered_credentials());

        auth.sign_out(&mut store, false).unwrap();
        assert!(!store.is_authenticated());

        let user = auth.sign_in_with_biometrics(&mut store, true).unwrap();
        assert_eq!(user.email, "me@example.com");
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_failed_biometrics_leave_session_alone() {
        let auth = AuthService::new(MemoryCredentials::new());
        let mut store = AppStore::in_memory();

        let result = auth.sign_in_with_biometrics(&mut store, false);
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_biometrics_without_saved_credentials() {
        let auth = AuthService::new(MemoryCredentials::new());
        let mut store = AppStore::in_memory();

        auth.sign_in(&mut store, "me@example.com", "pw", false).unwrap();
        auth.sign_out(&mut store, true).unwrap();

        assert!(!auth.has_remembered_credentials());
        assert!(auth.sign_in_with_biometrics(&mut store, true).is_err());
    }

    #[test]
    fn test_sign_in_validation_propagates() {
        let auth = AuthService::new(MemoryCredentials::new());
        let mut store = AppStore::in_memory();

        assert!(matches!(
            auth.sign_in(&mut store, "", "", true),
            Err(AppError::Validation(_))
        ));
        assert!(!auth.has_remembered_credentials());
    }
}

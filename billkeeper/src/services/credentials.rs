//! Credential storage for the login screen
//!
//! Remembered sign-in credentials, kept in the OS credential store so a
//! later biometric unlock can sign the user back in.

use crate::error::{AppError, Result};
use keyring::Entry;
use std::sync::{Arc, Mutex};

const SERVICE_NAME: &str = "BillKeeper";
const REMEMBERED_EMAIL_KEY: &str = "remembered_email";
const REMEMBERED_PASSWORD_KEY: &str = "remembered_password";

/// Email and password saved for biometric sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub email: String,
    pub password: String,
}

/// Somewhere to remember the last sign-in
pub trait CredentialStore: Send + Sync {
    fn remember(&self, credentials: &StoredCredentials) -> Result<()>;

    /// `Ok(None)` when nothing is remembered
    fn recall(&self) -> Result<Option<StoredCredentials>>;

    fn forget(&self) -> Result<()>;
}

/// OS credential manager: Windows Credential Manager, macOS Keychain, or
/// the Linux kernel keyring (kept for the login session). Platforms with
/// no native store fall back to keyring's mock, which cannot hold a secret
/// between entries; `remember` detects that and reports an error.
#[derive(Clone)]
pub struct KeyringCredentials {
    service: String,
}

impl Default for KeyringCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentials {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Entries under a different service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Credential(format!(
                "Failed to retrieve credential: {}",
                e
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| AppError::Credential(format!("Failed to store credential: {}", e)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Credential(format!(
                "Failed to delete credential: {}",
                e
            ))),
        }
    }
}

impl CredentialStore for KeyringCredentials {
    fn remember(&self, credentials: &StoredCredentials) -> Result<()> {
        self.write(REMEMBERED_EMAIL_KEY, &credentials.email)?;
        self.write(REMEMBERED_PASSWORD_KEY, &credentials.password)?;

        // A fresh entry must see what was just written
        if self.recall()?.as_ref() != Some(credentials) {
            return Err(AppError::Credential(
                "No persistent credential store available on this platform".to_string(),
            ));
        }

        tracing::info!("Sign-in credentials stored in credential manager");
        Ok(())
    }

    fn recall(&self) -> Result<Option<StoredCredentials>> {
        let email = self.read(REMEMBERED_EMAIL_KEY)?;
        let password = self.read(REMEMBERED_PASSWORD_KEY)?;

        Ok(email
            .zip(password)
            .map(|(email, password)| StoredCredentials { email, password }))
    }

    fn forget(&self) -> Result<()> {
        self.delete(REMEMBERED_EMAIL_KEY)?;
        self.delete(REMEMBERED_PASSWORD_KEY)?;

        tracing::info!("Sign-in credentials removed from credential manager");
        Ok(())
    }
}

/// Process-local credential store; clones share the same slot
#[derive(Clone, Default)]
pub struct MemoryCredentials {
    slot: Arc<Mutex<Option<StoredCredentials>>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<StoredCredentials>>> {
        self.slot
            .lock()
            .map_err(|_| AppError::Credential("Credential slot poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentials {
    fn remember(&self, credentials: &StoredCredentials) -> Result<()> {
        *self.lock()? = Some(credentials.clone());
        Ok(())
    }

    fn recall(&self) -> Result<Option<StoredCredentials>> {
        Ok(self.lock()?.clone())
    }

    fn forget(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

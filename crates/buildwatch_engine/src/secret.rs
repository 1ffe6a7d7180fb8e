use buildwatch_core::persist::{SECRET_ACCOUNT, SECRET_SERVICE};
use buildwatch_core::{PersistError, SecretStore};

/// Server secret kept in the OS keyring under a fixed service/account pair.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
    account: String,
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(SECRET_SERVICE, SECRET_ACCOUNT)
    }
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, PersistError> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|err| PersistError::Secret(format!("failed to open keyring entry: {err}")))
    }
}

impl SecretStore for KeyringSecretStore {
    fn read_secret(&self) -> Result<Option<String>, PersistError> {
        match self.entry()?.get_password() {
            Ok(secret) if secret.is_empty() => Ok(None),
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(PersistError::Secret(format!(
                "failed to read secret from keyring: {err}"
            ))),
        }
    }

    fn write_secret(&self, secret: &str) -> Result<(), PersistError> {
        let entry = self.entry()?;
        // An empty secret means "no credentials"; keep nothing rather than a blank entry.
        if secret.is_empty() {
            return match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(PersistError::Secret(format!(
                    "failed to clear keyring secret: {err}"
                ))),
            };
        }
        entry
            .set_password(secret)
            .map_err(|err| PersistError::Secret(format!("failed to store secret in keyring: {err}")))
    }
}

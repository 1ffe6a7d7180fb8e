use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use thiserror::Error;

pub const JOBS_KEY: &str = "jobs";
pub const SERVER_URL_KEY: &str = "server_url";
pub const USERNAME_KEY: &str = "server_username";

/// Fixed service/account pair the secret is filed under.
pub const SECRET_SERVICE: &str = "buildwatch";
pub const SECRET_ACCOUNT: &str = "server-secret";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("data directory missing or not writable: {0}")]
    DataDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("secret store error: {0}")]
    Secret(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key/value storage for jobs and non-secret settings.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// Secure storage for the server password/token.
pub trait SecretStore: Send + Sync {
    fn read_secret(&self) -> Result<Option<String>, PersistError>;
    fn write_secret(&self, secret: &str) -> Result<(), PersistError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        (**self).set(key, value)
    }
}

impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    fn read_secret(&self) -> Result<Option<String>, PersistError> {
        (**self).read_secret()
    }

    fn write_secret(&self, secret: &str) -> Result<(), PersistError> {
        (**self).write_secret(secret)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    secret: Option<String>,
    fail_writes: bool,
}

/// In-process store; clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for exercising best-effort durability.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    fn with_inner<R>(
        &self,
        f: impl FnOnce(&mut MemoryInner) -> Result<R, PersistError>,
    ) -> Result<R, PersistError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PersistError::Unavailable("memory store lock poisoned".into()))?;
        f(&mut inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.with_inner(|inner| Ok(inner.values.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.with_inner(|inner| {
            if inner.fail_writes {
                return Err(PersistError::Unavailable("writes disabled".into()));
            }
            inner.values.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}

impl SecretStore for MemoryStore {
    fn read_secret(&self) -> Result<Option<String>, PersistError> {
        self.with_inner(|inner| Ok(inner.secret.clone()))
    }

    fn write_secret(&self, secret: &str) -> Result<(), PersistError> {
        self.with_inner(|inner| {
            if inner.fail_writes {
                return Err(PersistError::Secret("writes disabled".into()));
            }
            inner.secret = Some(secret.to_string());
            Ok(())
        })
    }
}

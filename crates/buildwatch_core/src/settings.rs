use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use engine_logging::{engine_warn, Redacted};

use crate::locator::collapse_slashes;
use crate::persist::{KeyValueStore, PersistError, SecretStore, SERVER_URL_KEY, USERNAME_KEY};

/// Server connection settings. Last write wins.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub username: String,
    pub secret: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("secret", &Redacted(&self.secret))
            .finish()
    }
}

impl Settings {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Without a base URL there is nothing to poll.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    /// `{base}/{path}/api/json`, or `None` when unconfigured.
    pub fn status_url(&self, job_path: &str) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        let base = self.base_url.trim().trim_matches('/');
        let path = collapse_slashes(job_path.trim_matches('/'));
        Some(format!("{base}/{path}/api/json"))
    }

    /// Basic auth header value; only sent when both username and secret are set.
    pub fn authorization(&self) -> Option<String> {
        if self.username.is_empty() || self.secret.is_empty() {
            return None;
        }
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.secret));
        Some(format!("Basic {encoded}"))
    }

    /// Read settings from their two stores. Missing or unreadable values load as empty.
    pub fn load(values: &dyn KeyValueStore, secrets: &dyn SecretStore) -> Self {
        let base_url = read_value(values, SERVER_URL_KEY);
        let username = read_value(values, USERNAME_KEY);
        let secret = match secrets.read_secret() {
            Ok(secret) => secret.unwrap_or_default(),
            Err(err) => {
                engine_warn!("Failed to read server secret: {}", err);
                String::new()
            }
        };
        Self {
            base_url,
            username,
            secret,
        }
    }

    /// Write the URL and username to the value store and the secret to the secret store.
    ///
    /// Every write is attempted even when an earlier one fails; the first error is returned.
    pub fn save(
        &self,
        values: &dyn KeyValueStore,
        secrets: &dyn SecretStore,
    ) -> Result<(), PersistError> {
        let results = [
            values.set(SERVER_URL_KEY, self.base_url.trim()),
            values.set(USERNAME_KEY, &self.username),
            secrets.write_secret(&self.secret),
        ];
        results.into_iter().collect()
    }
}

fn read_value(values: &dyn KeyValueStore, key: &str) -> String {
    match values.get(key) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            engine_warn!("Failed to read setting {}: {}", key, err);
            String::new()
        }
    }
}

//! Credential store.
//!
//! Credentials live in the `[credentials]` table of the config file. The
//! environment pair `VECTARA_CUSTOMER_ID` / `VECTARA_API_KEY` overrides the
//! file when both are set. Keys are never checked locally; a bad key only
//! shows up when the service rejects a request.

use std::path::{Path, PathBuf};

use crate::config::CredentialsConfig;
use crate::error::{Error, Result};

pub const CUSTOMER_ID_ENV: &str = "VECTARA_CUSTOMER_ID";
pub const API_KEY_ENV: &str = "VECTARA_API_KEY";

/// Customer id and API key used to authenticate every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub customer_id: String,
    pub api_key: String,
}

impl From<CredentialsConfig> for Credentials {
    fn from(c: CredentialsConfig) -> Self {
        Self {
            customer_id: c.customer_id,
            api_key: c.api_key,
        }
    }
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the stored credentials, preferring the process environment.
    pub fn get_api_keys(&self) -> Result<Credentials> {
        self.get_api_keys_with(|name| std::env::var(name).ok())
    }

    /// Same as [`get_api_keys`](Self::get_api_keys) with an injectable
    /// environment lookup.
    pub fn get_api_keys_with<F>(&self, env: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let (Some(customer_id), Some(api_key)) = (env(CUSTOMER_ID_ENV), env(API_KEY_ENV)) {
            if !customer_id.is_empty() && !api_key.is_empty() {
                return Ok(Credentials {
                    customer_id,
                    api_key,
                });
            }
        }

        let config = crate::config::load_config(&self.path)?;
        match config.credentials {
            Some(c) if !c.customer_id.is_empty() && !c.api_key.is_empty() => Ok(c.into()),
            _ => Err(Error::Configuration(format!(
                "API keys not found in {}. Run `vectara set-api-keys <customer_id> <api_key>` \
                 or set {} and {}.",
                self.path.display(),
                CUSTOMER_ID_ENV,
                API_KEY_ENV
            ))),
        }
    }

    /// Persist credentials, replacing any previous `[credentials]` table and
    /// keeping the rest of the file intact.
    pub fn set_api_keys(&self, customer_id: &str, api_key: &str) -> Result<()> {
        let mut doc: toml::Table = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            toml::from_str(&content).map_err(|e| {
                Error::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    self.path.display(),
                    e
                ))
            })?
        } else {
            toml::Table::new()
        };

        let creds = CredentialsConfig {
            customer_id: customer_id.to_string(),
            api_key: api_key.to_string(),
        };
        let value = toml::Value::try_from(&creds)
            .map_err(|e| Error::Configuration(format!("Failed to encode credentials: {}", e)))?;
        doc.insert("credentials".to_string(), value);

        let content = toml::to_string_pretty(&doc)
            .map_err(|e| Error::Configuration(format!("Failed to encode config: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "credentials written");
        Ok(())
    }
}

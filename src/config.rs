use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that overrides the default config file location.
pub const CONFIG_ENV: &str = "VECTARA_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub span: SpanConfig,
    #[serde(default)]
    pub ner: NerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CredentialsConfig {
    pub customer_id: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_service_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.vectara.io".to_string()
}
fn default_service_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpanConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for SpanConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            model_type: default_model_type(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_chunk_size() -> usize {
    crate::chunk::DEFAULT_CHUNK_SIZE
}
fn default_model_type() -> String {
    "span_marker".to_string()
}
fn default_include_globs() -> Vec<String> {
    vec!["*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct NerConfig {
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    #[serde(default = "default_spacy_url")]
    pub spacy_url: String,
    #[serde(default = "default_ner_timeout")]
    pub timeout_secs: u64,
    /// Extra `name = "identifier"` entries merged over the built-in model table.
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            inference_url: default_inference_url(),
            spacy_url: default_spacy_url(),
            timeout_secs: default_ner_timeout(),
            models: BTreeMap::new(),
        }
    }
}

fn default_inference_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}
fn default_spacy_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_ner_timeout() -> u64 {
    120
}

/// Resolve the config file path: explicit flag, then `$VECTARA_CONFIG`,
/// then `$HOME/.vectara/config.toml`, then `./vectara.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".vectara").join("config.toml"),
        None => PathBuf::from("vectara.toml"),
    }
}

/// Load and validate the configuration file.
///
/// A missing file is not an error: credentials can still come from the
/// environment, and every other section has defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| {
        Error::Configuration(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.span.chunk_size == 0 {
            return Err(Error::Configuration(
                "span.chunk_size must be > 0".to_string(),
            ));
        }
        if self.service.base_url.trim().is_empty() {
            return Err(Error::Configuration(
                "service.base_url must not be empty".to_string(),
            ));
        }
        match self.span.model_type.as_str() {
            "span_marker" | "spacy" => {}
            other => {
                return Err(Error::Configuration(format!(
                    "Unknown span.model_type: '{}'. Must be span_marker or spacy.",
                    other
                )))
            }
        }
        Ok(())
    }
}

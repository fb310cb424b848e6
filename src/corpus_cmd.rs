//! Corpus lifecycle commands: `set-api-keys`, `create-corpus`,
//! `create-corpus-advanced`, `delete-corpus`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::client::{connect, CorpusService};
use crate::credentials::CredentialStore;
use crate::models::{
    parse_corpus_id, parse_custom_dimensions, parse_filter_attributes, CorpusConfig, CorpusId,
};
use crate::usage;

/// Optional corpus settings shared by both create commands.
#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub custom_dimensions: Option<String>,
    pub filter_attributes: Option<String>,
    pub public: bool,
    pub encoder_id: u64,
    pub metadata_max_bytes: u64,
    pub swap_qenc: bool,
    pub swap_ienc: bool,
    pub textless: bool,
    pub encrypted: bool,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        let base = CorpusConfig::new("", "");
        Self {
            custom_dimensions: None,
            filter_attributes: None,
            public: base.public,
            encoder_id: base.encoder_id,
            metadata_max_bytes: base.metadata_max_bytes,
            swap_qenc: base.swap_qenc,
            swap_ienc: base.swap_ienc,
            textless: base.textless,
            encrypted: base.encrypted,
        }
    }
}

/// Turn CLI options into a corpus payload. JSON options are checked here,
/// before any request is made.
pub fn build_corpus_config(
    name: &str,
    description: &str,
    opts: &CorpusOptions,
) -> crate::error::Result<CorpusConfig> {
    let mut config = CorpusConfig::new(name, description);
    if let Some(json) = &opts.custom_dimensions {
        config.custom_dimensions = parse_custom_dimensions(json)?;
    }
    if let Some(json) = &opts.filter_attributes {
        config.filter_attributes = parse_filter_attributes(json)?;
    }
    config.public = opts.public;
    config.encoder_id = opts.encoder_id;
    config.metadata_max_bytes = opts.metadata_max_bytes;
    config.swap_qenc = opts.swap_qenc;
    config.swap_ienc = opts.swap_ienc;
    config.textless = opts.textless;
    config.encrypted = opts.encrypted;
    Ok(config)
}

pub fn run_set_api_keys(
    store: &CredentialStore,
    customer_id: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let (Some(customer_id), Some(api_key)) = (customer_id, api_key) else {
        println!("{}", usage::SET_API_KEYS);
        return Ok(());
    };
    store
        .set_api_keys(&customer_id, &api_key)
        .with_context(|| format!("failed to write {}", store.path().display()))?;
    println!("API keys saved to {}", store.path().display());
    Ok(())
}

pub fn run_create_corpus(
    config_path: &Path,
    corpus_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    opts: &CorpusOptions,
) -> Result<()> {
    let (Some(corpus_id), Some(name), Some(description)) = (corpus_id, name, description) else {
        println!("{}", usage::CREATE_CORPUS);
        return Ok(());
    };
    let mut config = build_corpus_config(&name, &description, opts)?;
    config.id = Some(parse_corpus_id(&corpus_id)?);

    let (_, client) = connect(config_path)?;
    create_and_report(&client, &config)?;
    Ok(())
}

pub fn run_create_corpus_advanced(
    config_path: &Path,
    name: Option<String>,
    description: Option<String>,
    opts: &CorpusOptions,
) -> Result<()> {
    let (Some(name), Some(description)) = (name, description) else {
        println!("{}", usage::CREATE_CORPUS_ADVANCED);
        return Ok(());
    };
    let config = build_corpus_config(&name, &description, opts)?;

    let (_, client) = connect(config_path)?;
    create_and_report(&client, &config)?;
    Ok(())
}

pub fn run_delete_corpus(config_path: &Path, corpus_id: Option<String>) -> Result<()> {
    let Some(corpus_id) = corpus_id else {
        println!("{}", usage::DELETE_CORPUS);
        return Ok(());
    };
    let corpus_id = parse_corpus_id(&corpus_id)?;

    let (_, client) = connect(config_path)?;
    client
        .delete_corpus(corpus_id)
        .with_context(|| format!("failed to delete corpus {}", corpus_id))?;
    println!("Corpus {} deleted.", corpus_id);
    Ok(())
}

/// Create the corpus and print the id the service assigned.
fn create_and_report(service: &dyn CorpusService, config: &CorpusConfig) -> Result<CorpusId> {
    let id = service
        .create_corpus(config)
        .with_context(|| format!("failed to create corpus '{}'", config.name))?;
    println!("Corpus '{}' created with id {}", config.name, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeService;

    #[test]
    fn test_defaults_match_service_defaults() {
        let config = build_corpus_config("Docs", "all docs", &CorpusOptions::default()).unwrap();
        assert!(!config.public);
        assert!(config.encrypted);
        assert_eq!(config.encoder_id, 1);
        assert_eq!(config.metadata_max_bytes, 10_000);
        assert!(config.custom_dimensions.is_empty());
        assert!(config.id.is_none());
    }

    #[test]
    fn test_options_flow_into_payload() {
        let opts = CorpusOptions {
            custom_dimensions: Some(r#"{"subject": "Computer Science"}"#.to_string()),
            filter_attributes: Some(r#"{"author": "John Doe"}"#.to_string()),
            public: true,
            textless: true,
            ..CorpusOptions::default()
        };
        let config = build_corpus_config("Research", "papers", &opts).unwrap();
        assert!(config.public);
        assert!(config.textless);
        assert_eq!(config.custom_dimensions[0].name, "subject");
        assert_eq!(config.filter_attributes[0].name, "author");
        assert_eq!(config.filter_attributes[0].description, "John Doe");
    }

    #[test]
    fn test_bad_json_rejected_before_any_call() {
        let opts = CorpusOptions {
            custom_dimensions: Some("not json".to_string()),
            ..CorpusOptions::default()
        };
        assert!(build_corpus_config("a", "b", &opts).is_err());
    }

    #[test]
    fn test_create_reports_service_assigned_id() {
        let service = FakeService::default();
        let mut config = CorpusConfig::new("Docs", "d");
        config.id = Some(99);

        let id = create_and_report(&service, &config).unwrap();

        assert_eq!(service.created()[0].id, Some(99));
        assert_eq!(id, 1);
    }
}

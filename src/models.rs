//! Core data types that flow between the CLI, the corpus service client,
//! and the span-enhance pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Corpus identifier assigned by the service.
pub type CorpusId = u64;

/// Settings for a new corpus. Field names follow the service's JSON casing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorpusConfig {
    /// Requested id. The service may ignore it and assign its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CorpusId>,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub public: bool,
    pub swap_qenc: bool,
    pub swap_ienc: bool,
    pub textless: bool,
    pub encrypted: bool,
    pub encoder_id: u64,
    pub metadata_max_bytes: u64,
    pub custom_dimensions: Vec<CustomDimension>,
    pub filter_attributes: Vec<FilterAttribute>,
}

impl CorpusConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            enabled: true,
            public: false,
            swap_qenc: false,
            swap_ienc: false,
            textless: false,
            encrypted: true,
            encoder_id: 1,
            metadata_max_bytes: 10_000,
            custom_dimensions: Vec::new(),
            filter_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CustomDimension {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterAttribute {
    pub name: String,
    pub description: String,
    pub indexed: bool,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub level: String,
}

impl FilterAttribute {
    /// An indexed, document-level text attribute.
    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            indexed: true,
            attribute_type: "FILTER_ATTRIBUTE_TYPE__TEXT".to_string(),
            level: "FILTER_ATTRIBUTE_LEVEL__DOCUMENT".to_string(),
        }
    }
}

/// Parse a `{"key": "value", ...}` option string into name/description pairs.
///
/// Non-string values are kept in their JSON form.
pub fn parse_string_map(option: &str, json: &str) -> Result<Vec<(String, String)>> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("--{} is not valid JSON: {}", option, e)))?;
    let map = value
        .as_object()
        .ok_or_else(|| Error::Validation(format!("--{} must be a JSON object", option)))?;

    Ok(map
        .iter()
        .map(|(k, v)| {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect())
}

pub fn parse_custom_dimensions(json: &str) -> Result<Vec<CustomDimension>> {
    Ok(parse_string_map("custom_dimensions", json)?
        .into_iter()
        .map(|(name, description)| CustomDimension { name, description })
        .collect())
}

pub fn parse_filter_attributes(json: &str) -> Result<Vec<FilterAttribute>> {
    Ok(parse_string_map("filter_attributes", json)?
        .into_iter()
        .map(|(name, description)| FilterAttribute::text(name, description))
        .collect())
}

/// Parse a metadata option that must be a JSON object.
pub fn parse_metadata(json: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("metadata is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(Error::Validation(
            "metadata must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Parse a corpus id given on the command line.
pub fn parse_corpus_id(arg: &str) -> Result<CorpusId> {
    arg.trim().parse().map_err(|_| {
        Error::Validation(format!("corpus_id must be an integer, got '{}'", arg))
    })
}

/// A document indexed directly from text.
#[derive(Debug, Clone)]
pub struct Document {
    pub corpus_id: CorpusId,
    pub document_id: String,
    pub title: String,
    pub metadata: serde_json::Value,
    pub section_text: String,
}

/// Service acknowledgement for an index call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexAck {
    pub status_code: String,
    pub status_detail: String,
}

/// Outcome of uploading one file from a folder.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub document_id: String,
    pub success: bool,
    pub extracted_text: Option<String>,
}

/// A labeled span produced by a NER backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub span: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Entity {
    pub fn new(span: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            span: span.into(),
            label: label.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub corpus_id: CorpusId,
    pub query: String,
    pub start: u32,
    pub num_results: u32,
    pub metadata_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub text: String,
    pub score: f64,
    pub document_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

//! Entity extraction adapter.
//!
//! [`Span`] wraps one NER backend selected by model name and type. Names are
//! resolved through an explicit [`ModelTable`]; each backend family
//! implements [`EntityExtractor`] and returns the same [`Entity`] shape.
//!
//! Backends:
//! - **[`SpanMarkerBackend`]**: `span_marker` models served behind a
//!   Hugging Face style inference endpoint. Entities carry a score.
//! - **[`SpacyBackend`]**: a spaCy pipeline served over HTTP that returns
//!   `[span, label]` pairs. Entities carry no score.
//!
//! Model output is an external dependency: the same model on the same text
//! is expected to return the same entities, but nothing here enforces it.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::NerConfig;
use crate::error::{Error, Result};
use crate::models::Entity;

/// Bearer token sent to the span_marker inference endpoint when set.
pub const INFERENCE_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Capability shared by every NER backend.
pub trait EntityExtractor {
    fn infer(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Backend family selected by the `model_type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    SpanMarker,
    Spacy,
}

impl ModelType {
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "span_marker" => Ok(ModelType::SpanMarker),
            "spacy" => Ok(ModelType::Spacy),
            other => Err(Error::Validation(format!(
                "Unsupported model type: '{}'. Must be span_marker or spacy.",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::SpanMarker => "span_marker",
            ModelType::Spacy => "spacy",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short model name → backend model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTable {
    entries: BTreeMap<String, String>,
}

impl Default for ModelTable {
    fn default() -> Self {
        let entries = [
            (
                "fewnerdsuperfine",
                "tomaarsen/span-marker-bert-base-fewnerd-fine-super",
            ),
            ("multinerd", "tomaarsen/span-marker-mbert-base-multinerd"),
            (
                "largeontonote",
                "tomaarsen/span-marker-roberta-large-ontonotes5",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { entries }
    }
}

impl ModelTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Built-in entries overlaid with `[ner.models]` from the config.
    pub fn from_config(config: &NerConfig) -> Self {
        let mut table = Self::default();
        for (name, id) in &config.models {
            table.insert(name, id);
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, identifier: impl Into<String>) {
        self.entries.insert(name.into(), identifier.into());
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ============ span_marker backend ============

/// Calls `POST {inference_url}/{model_id}` with `{"inputs": text}`.
pub struct SpanMarkerBackend {
    http: Client,
    url: String,
    token: Option<String>,
}

/// One record in an inference response. Field names vary between servers.
#[derive(Debug, Deserialize)]
struct ScoredRecord {
    #[serde(alias = "word", alias = "text")]
    span: String,
    #[serde(alias = "entity_group", alias = "entity")]
    label: String,
    #[serde(default)]
    score: Option<f64>,
}

impl SpanMarkerBackend {
    pub fn new(model_id: &str, config: &NerConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            url: format!("{}/{}", config.inference_url.trim_end_matches('/'), model_id),
            token: std::env::var(INFERENCE_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        })
    }
}

impl EntityExtractor for SpanMarkerBackend {
    fn infer(&self, text: &str) -> Result<Vec<Entity>> {
        let mut req = self.http.post(&self.url).json(&json!({ "inputs": text }));
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        let body = send(req)?;
        parse_scored_records(&body)
    }
}

pub(crate) fn parse_scored_records(body: &str) -> Result<Vec<Entity>> {
    let records: Vec<ScoredRecord> = serde_json::from_str(body)
        .map_err(|e| Error::Model(format!("unexpected inference response ({}): {}", e, body)))?;
    Ok(records
        .into_iter()
        .map(|r| Entity {
            span: r.span.trim().to_string(),
            label: r.label,
            score: r.score,
        })
        .collect())
}

// ============ spaCy backend ============

/// Calls `POST {spacy_url}/ents` with `{"text": ..., "model": ...}`.
pub struct SpacyBackend {
    http: Client,
    url: String,
    model_id: String,
}

impl SpacyBackend {
    pub fn new(model_id: &str, config: &NerConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            url: format!("{}/ents", config.spacy_url.trim_end_matches('/')),
            model_id: model_id.to_string(),
        })
    }
}

impl EntityExtractor for SpacyBackend {
    fn infer(&self, text: &str) -> Result<Vec<Entity>> {
        let req = self
            .http
            .post(&self.url)
            .json(&json!({ "text": text, "model": self.model_id }));
        let body = send(req)?;
        parse_span_label_pairs(&body)
    }
}

pub(crate) fn parse_span_label_pairs(body: &str) -> Result<Vec<Entity>> {
    let pairs: Vec<(String, String)> = serde_json::from_str(body)
        .map_err(|e| Error::Model(format!("unexpected spaCy response ({}): {}", e, body)))?;
    Ok(pairs
        .into_iter()
        .map(|(span, label)| Entity::new(span, label))
        .collect())
}

fn build_http(config: &NerConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Error::Model(format!("Failed to build HTTP client: {}", e)))
}

fn send(req: reqwest::blocking::RequestBuilder) -> Result<String> {
    let resp = req
        .send()
        .map_err(|e| Error::Model(format!("NER backend unreachable: {}", e)))?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| Error::Model(format!("failed to read NER response ({}): {}", status, e)))?;
    if !status.is_success() {
        return Err(Error::Model(format!("NER backend error {}: {}", status, body)));
    }
    Ok(body)
}

// ============ Adapter ============

/// NER over a text buffer with one loaded model.
///
/// The backend is built once by [`load_model`](Span::load_model) and reused
/// for every [`set_text`](Span::set_text) / [`analyze_text`](Span::analyze_text)
/// cycle.
pub struct Span {
    text: String,
    model_name: String,
    model_type: String,
    table: ModelTable,
    ner: NerConfig,
    extractor: Option<Box<dyn EntityExtractor>>,
}

impl Span {
    pub fn new(
        text: impl Into<String>,
        model_name: impl Into<String>,
        model_type: impl Into<String>,
        table: ModelTable,
        ner: NerConfig,
    ) -> Self {
        Self {
            text: text.into(),
            model_name: model_name.into(),
            model_type: model_type.into(),
            table,
            ner,
            extractor: None,
        }
    }

    /// Adapter with an already-built backend, skipping name resolution.
    pub fn with_extractor(
        text: impl Into<String>,
        model_name: impl Into<String>,
        extractor: Box<dyn EntityExtractor>,
    ) -> Self {
        Self {
            text: text.into(),
            model_name: model_name.into(),
            model_type: String::new(),
            table: ModelTable::empty(),
            ner: NerConfig::default(),
            extractor: Some(extractor),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_loaded(&self) -> bool {
        self.extractor.is_some()
    }

    /// Resolve the model name and build the backend for the model type.
    pub fn load_model(&mut self) -> Result<()> {
        let model_id = self.table.resolve(&self.model_name).ok_or_else(|| {
            Error::Validation(format!(
                "Model name '{}' is not recognized. Known models: {}",
                self.model_name,
                self.table.names().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let extractor: Box<dyn EntityExtractor> = match ModelType::parse(&self.model_type)? {
            ModelType::SpanMarker => Box::new(SpanMarkerBackend::new(model_id, &self.ner)?),
            ModelType::Spacy => Box::new(SpacyBackend::new(model_id, &self.ner)?),
        };
        tracing::debug!(model = %self.model_name, %model_id, model_type = %self.model_type, "model loaded");
        self.extractor = Some(extractor);
        Ok(())
    }

    pub fn run_inference(&self) -> Result<Vec<Entity>> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or_else(|| Error::Validation("Model not loaded".to_string()))?;
        extractor.infer(&self.text)
    }

    /// Render entities as a readable listing and return them as records.
    pub fn format_output(&self, entities: Vec<Entity>) -> (String, Vec<Entity>) {
        let mut output = format!("Entities found in text: {}\n", self.text);
        for entity in &entities {
            match entity.score {
                Some(score) => output.push_str(&format!(
                    "{}: {}, Score: {}\n",
                    entity.span, entity.label, score
                )),
                None => output.push_str(&format!("{}: {}\n", entity.span, entity.label)),
            }
        }
        (output, entities)
    }

    pub fn analyze_text(&self) -> Result<(String, Vec<Entity>)> {
        if self.extractor.is_none() {
            return Err(Error::Validation(format!(
                "Model '{}' not loaded.",
                self.model_name
            )));
        }
        let entities = self.run_inference()?;
        Ok(self.format_output(entities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubExtractor;

    #[test]
    fn test_unknown_model_name_not_recognized() {
        let mut span = Span::new(
            "text",
            "foo",
            "span_marker",
            ModelTable::default(),
            NerConfig::default(),
        );
        let err = span.load_model().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("not recognized"));
        assert!(!span.is_loaded());
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let mut span = Span::new(
            "text",
            "multinerd",
            "flair",
            ModelTable::default(),
            NerConfig::default(),
        );
        let err = span.load_model().unwrap_err();
        assert!(err.to_string().contains("Unsupported model type"));
    }

    #[test]
    fn test_load_builds_backend_without_network() {
        let mut span = Span::new(
            "text",
            "largeontonote",
            "spacy",
            ModelTable::default(),
            NerConfig::default(),
        );
        span.load_model().unwrap();
        assert!(span.is_loaded());
    }

    #[test]
    fn test_injected_table_entry_resolves() {
        let mut table = ModelTable::empty();
        table.insert("tiny", "org/tiny-ner");
        assert_eq!(table.resolve("tiny"), Some("org/tiny-ner"));
        assert_eq!(table.resolve("multinerd"), None);

        let mut cfg = NerConfig::default();
        cfg.models.insert("tiny".into(), "org/tiny-ner".into());
        let merged = ModelTable::from_config(&cfg);
        assert_eq!(merged.resolve("tiny"), Some("org/tiny-ner"));
        assert!(merged.resolve("fewnerdsuperfine").is_some());
    }

    #[test]
    fn test_inference_requires_loaded_model() {
        let span = Span::new(
            "text",
            "multinerd",
            "span_marker",
            ModelTable::default(),
            NerConfig::default(),
        );
        assert!(span.run_inference().unwrap_err().to_string().contains("Model not loaded"));
        assert!(span.analyze_text().unwrap_err().to_string().contains("not loaded"));
    }

    #[test]
    fn test_analyze_text_formats_both_shapes() {
        let stub = StubExtractor::new(vec![
            Entity::new("Ada Lovelace", "person").with_score(0.98),
            Entity::new("London", "location"),
        ]);
        let span = Span::with_extractor("Ada Lovelace lived in London.", "stub", Box::new(stub));
        let (text, entities) = span.analyze_text().unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(
            text,
            "Entities found in text: Ada Lovelace lived in London.\n\
             Ada Lovelace: person, Score: 0.98\n\
             London: location\n"
        );
    }

    #[test]
    fn test_analyze_text_deterministic_for_fixed_backend() {
        let stub = StubExtractor::new(vec![Entity::new("Rust", "language")]);
        let span = Span::with_extractor("Rust is fast.", "stub", Box::new(stub));
        let first = span.analyze_text().unwrap();
        let second = span.analyze_text().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_scored_records_accepts_aliases() {
        let body = r#"[
            {"span": "Paris", "label": "location-GPE", "score": 0.97, "char_start_index": 0},
            {"entity_group": "ORG", "word": " Acme", "score": 0.5, "start": 10, "end": 14}
        ]"#;
        let entities = parse_scored_records(body).unwrap();
        assert_eq!(entities[0], Entity::new("Paris", "location-GPE").with_score(0.97));
        assert_eq!(entities[1], Entity::new("Acme", "ORG").with_score(0.5));
    }

    #[test]
    fn test_parse_span_label_pairs() {
        let entities = parse_span_label_pairs(r#"[["Berlin", "GPE"], ["Siemens", "ORG"]]"#).unwrap();
        assert_eq!(entities, vec![Entity::new("Berlin", "GPE"), Entity::new("Siemens", "ORG")]);

        let err = parse_span_label_pairs(r#"{"error": "model loading"}"#).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}

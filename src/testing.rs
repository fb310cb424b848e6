//! In-memory doubles for unit tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::client::CorpusService;
use crate::error::{Error, Result};
use crate::models::{CorpusConfig, CorpusId, Document, Entity, IndexAck, QueryHit, QueryRequest};
use crate::ner::EntityExtractor;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexCall {
    pub corpus_id: CorpusId,
    pub document_id: String,
    pub text: String,
    pub metadata_json: String,
}

/// Records every call. Uploads echo the file contents back as extracted text.
#[derive(Default)]
pub struct FakeService {
    created: RefCell<Vec<CorpusConfig>>,
    uploads: RefCell<Vec<(CorpusId, PathBuf)>>,
    indexed: RefCell<Vec<IndexCall>>,
    calls: RefCell<usize>,
    failing_uploads: HashSet<String>,
    failing_index_text: Option<String>,
}

impl FakeService {
    pub fn failing_uploads(mut self, names: &[&str]) -> Self {
        self.failing_uploads = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_index_on_text(mut self, text: &str) -> Self {
        self.failing_index_text = Some(text.to_string());
        self
    }

    pub fn created(&self) -> Vec<CorpusConfig> {
        self.created.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<(CorpusId, PathBuf)> {
        self.uploads.borrow().clone()
    }

    pub fn indexed(&self) -> Vec<IndexCall> {
        self.indexed.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }

    fn tick(&self) {
        *self.calls.borrow_mut() += 1;
    }
}

impl CorpusService for FakeService {
    fn create_corpus(&self, config: &CorpusConfig) -> Result<CorpusId> {
        self.tick();
        let mut created = self.created.borrow_mut();
        created.push(config.clone());
        Ok(created.len() as CorpusId)
    }

    fn delete_corpus(&self, _corpus_id: CorpusId) -> Result<()> {
        self.tick();
        Ok(())
    }

    fn upload_file(
        &self,
        corpus_id: CorpusId,
        path: &Path,
        _metadata: Option<&Value>,
        return_extracted: bool,
    ) -> Result<Option<String>> {
        self.tick();
        self.uploads.borrow_mut().push((corpus_id, path.to_path_buf()));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing_uploads.contains(&name) {
            return Err(Error::service(Some(500), format!("upload of {} rejected", name)));
        }
        if !return_extracted {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn index_document(&self, document: &Document) -> Result<IndexAck> {
        self.index_text(
            document.corpus_id,
            &document.document_id,
            &document.section_text,
            &document.metadata.to_string(),
        )
    }

    fn index_text(
        &self,
        corpus_id: CorpusId,
        document_id: &str,
        text: &str,
        metadata_json: &str,
    ) -> Result<IndexAck> {
        self.tick();
        if self.failing_index_text.as_deref() == Some(text) {
            return Err(Error::service(Some(500), "index rejected"));
        }
        self.indexed.borrow_mut().push(IndexCall {
            corpus_id,
            document_id: document_id.to_string(),
            text: text.to_string(),
            metadata_json: metadata_json.to_string(),
        });
        Ok(IndexAck {
            status_code: "OK".to_string(),
            status_detail: String::new(),
        })
    }

    fn query(&self, _request: &QueryRequest) -> Result<Vec<QueryHit>> {
        self.tick();
        Ok(Vec::new())
    }
}

/// Returns a fixed entity list, or a fixed error.
pub struct StubExtractor {
    entities: Vec<Entity>,
    error: Option<String>,
}

impl StubExtractor {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            entities: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

impl EntityExtractor for StubExtractor {
    fn infer(&self, _text: &str) -> Result<Vec<Entity>> {
        match &self.error {
            Some(message) => Err(Error::Model(message.clone())),
            None => Ok(self.entities.clone()),
        }
    }
}

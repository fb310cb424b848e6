//! Span-enhance pipeline.
//!
//! One run walks these stages:
//!
//! ```text
//! CreateCorpora → BulkUploadRaw → per document {
//!     ChunkText → RunEntityExtraction → BuildMetadata → UploadChunk
//! } → Done
//! ```
//!
//! Raw files go to the "plain" corpus with service-side extraction; the
//! extracted text is chunked, every chunk is run through the NER adapter,
//! and the chunk is indexed into the "enhanced" corpus with its entities as
//! metadata under the same document id.
//!
//! The run is best-effort. A document that fails to upload or yields no
//! text is skipped; a chunk whose inference or upload fails is recorded and
//! the run moves on. Only setup failures (model load, missing folder,
//! corpus creation) abort.

use std::fmt;
use std::path::Path;

use serde_json::json;

use crate::chunk::{chunk_text, DEFAULT_CHUNK_SIZE};
use crate::client::CorpusService;
use crate::error::{Error, Result};
use crate::folder::{index_documents_from_folder, FolderFilter};
use crate::models::{CorpusConfig, CorpusId, Entity};
use crate::ner::Span;
use crate::progress::{EnhanceProgressEvent, EnhanceProgressReporter, NoProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateCorpora,
    BulkUploadRaw,
    ChunkText,
    RunEntityExtraction,
    BuildMetadata,
    UploadChunk,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CreateCorpora => "create-corpora",
            Stage::BulkUploadRaw => "bulk-upload",
            Stage::ChunkText => "chunk",
            Stage::RunEntityExtraction => "entity-extraction",
            Stage::BuildMetadata => "build-metadata",
            Stage::UploadChunk => "upload-chunk",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A chunk that did not reach the enhanced corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    pub document_id: String,
    pub chunk_index: usize,
    pub stage: Stage,
    pub message: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceReport {
    pub plain_corpus: CorpusId,
    pub enhanced_corpus: CorpusId,
    pub documents_uploaded: usize,
    /// Documents with at least one enhanced chunk indexed.
    pub documents_enhanced: usize,
    pub skipped_documents: Vec<String>,
    pub chunks_uploaded: usize,
    pub chunk_failures: Vec<ChunkFailure>,
}

impl EnhanceReport {
    fn new(plain_corpus: CorpusId, enhanced_corpus: CorpusId) -> Self {
        Self {
            plain_corpus,
            enhanced_corpus,
            documents_uploaded: 0,
            documents_enhanced: 0,
            skipped_documents: Vec::new(),
            chunks_uploaded: 0,
            chunk_failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    pub chunk_size: usize,
    pub filter: FolderFilter,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            filter: FolderFilter::default(),
        }
    }
}

/// Serialize a chunk's entities as `{"entities": [...]}`.
pub fn build_metadata(entities: &[Entity]) -> Result<String> {
    Ok(serde_json::to_string(&json!({ "entities": entities }))?)
}

pub struct SpanEnhancer<'a> {
    service: &'a dyn CorpusService,
    span: Span,
    options: EnhanceOptions,
    progress: Box<dyn EnhanceProgressReporter>,
}

impl<'a> SpanEnhancer<'a> {
    pub fn new(service: &'a dyn CorpusService, span: Span, options: EnhanceOptions) -> Self {
        Self {
            service,
            span,
            options,
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn EnhanceProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Create the plain and enhanced corpora with default settings.
    pub fn create_corpora(&self) -> Result<(CorpusId, CorpusId)> {
        tracing::info!(stage = %Stage::CreateCorpora, "creating corpora");
        let plain = self
            .service
            .create_corpus(&CorpusConfig::new("Corpus 1", "First corpus for raw uploads"))?;
        let enhanced = self.service.create_corpus(&CorpusConfig::new(
            "Corpus 2",
            "Second corpus for processed uploads",
        ))?;
        Ok((plain, enhanced))
    }

    /// Create both corpora, then run [`span_enhance`](Self::span_enhance).
    pub fn process_and_upload(&mut self, folder: &Path) -> Result<EnhanceReport> {
        if !folder.is_dir() {
            return Err(missing_folder(folder));
        }
        self.ensure_model()?;
        let (plain, enhanced) = self.create_corpora()?;
        self.span_enhance(plain, enhanced, folder)
    }

    /// Upload `folder` to `plain_corpus` and its enhanced chunks to
    /// `enhanced_corpus`.
    pub fn span_enhance(
        &mut self,
        plain_corpus: CorpusId,
        enhanced_corpus: CorpusId,
        folder: &Path,
    ) -> Result<EnhanceReport> {
        if !folder.is_dir() {
            return Err(missing_folder(folder));
        }
        self.ensure_model()?;

        let mut report = EnhanceReport::new(plain_corpus, enhanced_corpus);

        tracing::info!(stage = %Stage::BulkUploadRaw, folder = %folder.display(), corpus = plain_corpus);
        self.progress.report(EnhanceProgressEvent::Uploading {
            folder: folder.display().to_string(),
        });
        let uploads = index_documents_from_folder(
            self.service,
            plain_corpus,
            folder,
            &self.options.filter,
            true,
        )?;

        let total = uploads.len() as u64;
        for (n, upload) in uploads.into_iter().enumerate() {
            if upload.success {
                report.documents_uploaded += 1;
            }
            let text = match upload.extracted_text {
                Some(text) if upload.success && !text.is_empty() => text,
                _ => {
                    tracing::warn!(
                        document = %upload.document_id,
                        "skipping document, upload failed or no text extracted"
                    );
                    report.skipped_documents.push(upload.document_id);
                    continue;
                }
            };

            let chunks = chunk_text(&upload.document_id, &text, self.options.chunk_size);
            tracing::debug!(stage = %Stage::ChunkText, document = %upload.document_id, chunks = chunks.len());
            self.progress.report(EnhanceProgressEvent::Enhancing {
                document: upload.document_id.clone(),
                n: n as u64 + 1,
                total,
                chunks: chunks.len() as u64,
            });

            let uploaded_before = report.chunks_uploaded;
            for chunk in chunks {
                match self.enhance_chunk(enhanced_corpus, &chunk.document_id, &chunk.text) {
                    Ok(()) => report.chunks_uploaded += 1,
                    Err((stage, err)) => {
                        tracing::warn!(
                            document = %chunk.document_id,
                            chunk = chunk.chunk_index,
                            %stage,
                            error = %err,
                            "chunk not enhanced"
                        );
                        report.chunk_failures.push(ChunkFailure {
                            document_id: chunk.document_id,
                            chunk_index: chunk.chunk_index,
                            stage,
                            message: err.to_string(),
                        });
                    }
                }
            }
            if report.chunks_uploaded > uploaded_before {
                report.documents_enhanced += 1;
            }
        }

        tracing::info!(
            stage = %Stage::Done,
            chunks = report.chunks_uploaded,
            failures = report.chunk_failures.len(),
            skipped = report.skipped_documents.len()
        );
        Ok(report)
    }

    fn ensure_model(&mut self) -> Result<()> {
        if !self.span.is_loaded() {
            self.span.load_model()?;
        }
        Ok(())
    }

    fn enhance_chunk(
        &mut self,
        corpus: CorpusId,
        document_id: &str,
        text: &str,
    ) -> std::result::Result<(), (Stage, Error)> {
        self.span.set_text(text);
        let (_, entities) = self
            .span
            .analyze_text()
            .map_err(|e| (Stage::RunEntityExtraction, e))?;
        let metadata = build_metadata(&entities).map_err(|e| (Stage::BuildMetadata, e))?;
        self.service
            .index_text(corpus, document_id, text, &metadata)
            .map_err(|e| (Stage::UploadChunk, e))?;
        Ok(())
    }
}

fn missing_folder(folder: &Path) -> Error {
    Error::Validation(format!(
        "The specified folder path does not exist: {}",
        folder.display()
    ))
}

//! Indexing commands: `index-document`, `index-text`, `upload-document`,
//! `upload-folder`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::client::{connect, CorpusService};
use crate::folder::{index_documents_from_folder, FolderFilter};
use crate::models::{parse_corpus_id, parse_metadata, CorpusId, Document, UploadResult};
use crate::usage;

pub struct IndexDocumentArgs {
    pub corpus_id: Option<String>,
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub metadata_json: Option<String>,
    pub section_text: Option<String>,
}

pub fn run_index_document(config_path: &Path, args: IndexDocumentArgs) -> Result<()> {
    let IndexDocumentArgs {
        corpus_id: Some(corpus_id),
        document_id: Some(document_id),
        title: Some(title),
        metadata_json: Some(metadata_json),
        section_text: Some(section_text),
    } = args
    else {
        println!("{}", usage::INDEX_DOCUMENT);
        return Ok(());
    };

    let document = Document {
        corpus_id: parse_corpus_id(&corpus_id)?,
        document_id,
        title,
        metadata: parse_metadata(&metadata_json)?,
        section_text,
    };

    let (_, client) = connect(config_path)?;
    let ack = client
        .index_document(&document)
        .with_context(|| format!("failed to index document '{}'", document.document_id))?;
    println!(
        "Document '{}' indexed into corpus {} ({})",
        document.document_id, document.corpus_id, ack.status_code
    );
    Ok(())
}

pub fn run_index_text(
    config_path: &Path,
    corpus_id: Option<String>,
    document_id: Option<String>,
    text: Option<String>,
    metadata_json: Option<String>,
) -> Result<()> {
    let (Some(corpus_id), Some(document_id), Some(text)) = (corpus_id, document_id, text) else {
        println!("{}", usage::INDEX_TEXT);
        return Ok(());
    };
    let corpus_id = parse_corpus_id(&corpus_id)?;
    let metadata = match metadata_json {
        Some(json) => parse_metadata(&json)?,
        None => serde_json::json!({}),
    };

    let (_, client) = connect(config_path)?;
    let ack = client
        .index_text(corpus_id, &document_id, &text, &metadata.to_string())
        .with_context(|| format!("failed to index text as '{}'", document_id))?;
    println!(
        "Text indexed into corpus {} as '{}' ({})",
        corpus_id, document_id, ack.status_code
    );
    Ok(())
}

pub fn run_upload_document(
    config_path: &Path,
    corpus_id: Option<String>,
    file_path: Option<PathBuf>,
) -> Result<()> {
    let (Some(corpus_id), Some(file_path)) = (corpus_id, file_path) else {
        println!("{}", usage::UPLOAD_DOCUMENT);
        return Ok(());
    };
    let corpus_id = parse_corpus_id(&corpus_id)?;
    if !file_path.is_file() {
        bail!("file not found: {}", file_path.display());
    }

    let (_, client) = connect(config_path)?;
    client
        .upload_file(corpus_id, &file_path, None, false)
        .with_context(|| format!("failed to upload {}", file_path.display()))?;
    println!("Uploaded {} to corpus {}", file_path.display(), corpus_id);
    Ok(())
}

pub fn run_upload_folder(
    config_path: &Path,
    corpus_id: Option<String>,
    folder_path: Option<PathBuf>,
) -> Result<()> {
    let (Some(corpus_id), Some(folder_path)) = (corpus_id, folder_path) else {
        println!("{}", usage::UPLOAD_FOLDER);
        return Ok(());
    };
    let corpus_id = parse_corpus_id(&corpus_id)?;

    let (cfg, client) = connect(config_path)?;
    let filter = FolderFilter::from_config(&cfg.span)?;
    let results = upload_folder(&client, corpus_id, &folder_path, &filter)?;
    print_upload_results(&results);
    Ok(())
}

fn upload_folder(
    service: &dyn CorpusService,
    corpus_id: CorpusId,
    folder: &Path,
    filter: &FolderFilter,
) -> Result<Vec<UploadResult>> {
    Ok(index_documents_from_folder(service, corpus_id, folder, filter, false)?)
}

fn print_upload_results(results: &[UploadResult]) {
    for r in results {
        println!("{:<8} {}", if r.success { "ok" } else { "FAILED" }, r.document_id);
    }
    let ok = results.iter().filter(|r| r.success).count();
    println!("{} of {} files uploaded.", ok, results.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeService;
    use tempfile::TempDir;

    #[test]
    fn test_upload_folder_reports_every_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();
        let service = FakeService::default().failing_uploads(&["a.txt"]);

        let results = upload_folder(&service, 3, tmp.path(), &FolderFilter::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
        assert!(results.iter().all(|r| r.extracted_text.is_none()));
    }
}

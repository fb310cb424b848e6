use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::client::CorpusService;
use crate::config::SpanConfig;
use crate::error::{Error, Result};
use crate::models::{CorpusId, UploadResult};

/// Which files in a folder take part in an upload.
#[derive(Debug, Clone)]
pub struct FolderFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FolderFilter {
    pub fn new(include_globs: &[String], exclude_globs: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_globset(include_globs)?,
            exclude: build_globset(exclude_globs)?,
        })
    }

    pub fn from_config(config: &SpanConfig) -> Result<Self> {
        Self::new(&config.include_globs, &config.exclude_globs)
    }

    fn accepts(&self, file_name: &str) -> bool {
        (self.include.is_empty() || self.include.is_match(file_name))
            && !self.exclude.is_match(file_name)
    }
}

impl Default for FolderFilter {
    fn default() -> Self {
        Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        }
    }
}

/// List the files directly inside `folder`, sorted by name.
///
/// Symlinks are followed, so a link to a file counts as a file. Dotfiles are
/// included unless an exclude glob names them. An empty include set accepts
/// every file. Files rejected by the globs are logged at debug level.
pub fn scan_folder(folder: &Path, filter: &FolderFilter) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(Error::Validation(format!(
            "The specified folder path does not exist: {}",
            folder.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable folder entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !filter.accepts(&name) {
            tracing::debug!(file = %name, "excluded by folder globs");
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

/// Upload every file in `folder` to `corpus_id`, one at a time.
///
/// Returns one [`UploadResult`] per file, keyed by file name. A failed
/// upload is recorded as `success = false` without extracted text; it never
/// aborts the batch. Only a missing folder is an error.
pub fn index_documents_from_folder(
    service: &dyn CorpusService,
    corpus_id: CorpusId,
    folder: &Path,
    filter: &FolderFilter,
    return_extracted_document: bool,
) -> Result<Vec<UploadResult>> {
    let files = scan_folder(folder, filter)?;
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let document_id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let result = match service.upload_file(corpus_id, &path, None, return_extracted_document) {
            Ok(extracted_text) => UploadResult {
                document_id,
                success: true,
                extracted_text: if return_extracted_document {
                    extracted_text
                } else {
                    None
                },
            },
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "upload failed");
                UploadResult {
                    document_id,
                    success: false,
                    extracted_text: None,
                }
            }
        };
        results.push(result);
    }

    Ok(results)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Configuration(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Configuration(format!("invalid glob set: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeService;
    use tempfile::TempDir;

    fn folder_with(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(tmp.path().join(name), body).unwrap();
        }
        tmp
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_sorted_includes_dotfiles_skips_dirs() {
        let tmp = folder_with(&[("b.txt", "b"), ("a.txt", "a"), (".notes.txt", "h")]);
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/c.txt"), "c").unwrap();

        let files = scan_folder(tmp.path(), &FolderFilter::default()).unwrap();
        assert_eq!(names(&files), vec![".notes.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_dotfiles_left_out_only_by_exclude_glob() {
        let tmp = folder_with(&[("a.txt", "a"), (".DS_Store", "x")]);
        let filter = FolderFilter::new(&["*".to_string()], &[".*".to_string()]).unwrap();
        let files = scan_folder(tmp.path(), &filter).unwrap();
        assert_eq!(names(&files), vec!["a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_every_file_gets_a_result_including_links() {
        let tmp = folder_with(&[("a.txt", "alpha"), (".notes.txt", "notes")]);
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("target.txt");
        std::fs::write(&target, "linked").unwrap();
        std::os::unix::fs::symlink(&target, tmp.path().join("link.txt")).unwrap();

        let service = FakeService::default();
        let results =
            index_documents_from_folder(&service, 1, tmp.path(), &FolderFilter::default(), true)
                .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec![".notes.txt", "a.txt", "link.txt"]);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[2].extracted_text.as_deref(), Some("linked"));
    }

    #[test]
    fn test_scan_applies_globs() {
        let tmp = folder_with(&[("a.txt", "a"), ("b.pdf", "b"), ("c.md", "c")]);
        let filter =
            FolderFilter::new(&["*.txt".to_string(), "*.pdf".to_string()], &["b.*".to_string()])
                .unwrap();
        let files = scan_folder(tmp.path(), &filter).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.txt"));
    }

    #[test]
    fn test_missing_folder_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = scan_folder(&missing, &FolderFilter::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_failed_upload_reported_without_text() {
        let tmp = folder_with(&[("good.txt", "Hello"), ("bad.txt", "Nope")]);
        let service = FakeService::default().failing_uploads(&["bad.txt"]);

        let results =
            index_documents_from_folder(&service, 1, tmp.path(), &FolderFilter::default(), true)
                .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            UploadResult {
                document_id: "bad.txt".to_string(),
                success: false,
                extracted_text: None,
            }
        );
        assert!(results[1].success);
        assert_eq!(results[1].extracted_text.as_deref(), Some("Hello"));
        assert_eq!(service.uploads().len(), 2);
    }

    #[test]
    fn test_no_text_when_not_requested() {
        let tmp = folder_with(&[("a.txt", "Hello")]);
        let service = FakeService::default();
        let results =
            index_documents_from_folder(&service, 1, tmp.path(), &FolderFilter::default(), false)
                .unwrap();
        assert!(results[0].success);
        assert!(results[0].extracted_text.is_none());
    }
}

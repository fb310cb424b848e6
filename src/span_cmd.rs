//! NER commands: `span-text`, `span-enhance-folder`, `process-and-upload`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::client::connect;
use crate::config::{load_config, Config};
use crate::enhance::{EnhanceOptions, EnhanceReport, SpanEnhancer};
use crate::folder::FolderFilter;
use crate::models::parse_corpus_id;
use crate::ner::{ModelTable, Span};
use crate::progress::ProgressMode;
use crate::usage;

/// Flags shared by the NER commands.
#[derive(Debug, Clone)]
pub struct SpanOptions {
    /// Overrides `span.model_type`.
    pub model_type: Option<String>,
    /// Overrides `span.chunk_size`.
    pub chunk_size: Option<usize>,
    pub progress: ProgressMode,
}

impl Default for SpanOptions {
    fn default() -> Self {
        Self {
            model_type: None,
            chunk_size: None,
            progress: ProgressMode::Off,
        }
    }
}

fn build_span(cfg: &Config, model_name: &str, opts: &SpanOptions) -> Span {
    let model_type = opts
        .model_type
        .clone()
        .unwrap_or_else(|| cfg.span.model_type.clone());
    Span::new(
        "",
        model_name,
        model_type,
        ModelTable::from_config(&cfg.ner),
        cfg.ner.clone(),
    )
}

fn enhance_options(cfg: &Config, opts: &SpanOptions) -> Result<EnhanceOptions> {
    let chunk_size = opts.chunk_size.unwrap_or(cfg.span.chunk_size);
    if chunk_size == 0 {
        anyhow::bail!("--chunk-size must be > 0");
    }
    Ok(EnhanceOptions {
        chunk_size,
        filter: FolderFilter::from_config(&cfg.span)?,
    })
}

/// Print the missing-folder message. Returns `true` when the folder exists.
fn check_folder(folder: &Path) -> bool {
    if folder.is_dir() {
        return true;
    }
    println!(
        "The specified folder path does not exist: {}",
        folder.display()
    );
    false
}

pub fn run_span_text(
    config_path: &Path,
    model_name: Option<String>,
    text: Option<String>,
    opts: &SpanOptions,
) -> Result<()> {
    let (Some(model_name), Some(text)) = (model_name, text) else {
        println!("{}", usage::SPAN_TEXT);
        return Ok(());
    };

    let cfg = load_config(config_path)?;
    let mut span = build_span(&cfg, &model_name, opts);
    span.set_text(text);
    span.load_model()
        .with_context(|| format!("failed to load model '{}'", model_name))?;
    let (output, _) = span.analyze_text()?;
    print!("{}", output);
    Ok(())
}

pub fn run_span_enhance_folder(
    config_path: &Path,
    corpus_id_1: Option<String>,
    corpus_id_2: Option<String>,
    model_name: Option<String>,
    folder_path: Option<PathBuf>,
    opts: &SpanOptions,
) -> Result<()> {
    let (Some(corpus_id_1), Some(corpus_id_2), Some(model_name), Some(folder_path)) =
        (corpus_id_1, corpus_id_2, model_name, folder_path)
    else {
        println!("{}", usage::SPAN_ENHANCE_FOLDER);
        return Ok(());
    };
    if !check_folder(&folder_path) {
        return Ok(());
    }
    let plain = parse_corpus_id(&corpus_id_1)?;
    let enhanced = parse_corpus_id(&corpus_id_2)?;

    let (cfg, client) = connect(config_path)?;
    let mut enhancer = SpanEnhancer::new(
        &client,
        build_span(&cfg, &model_name, opts),
        enhance_options(&cfg, opts)?,
    )
    .with_progress(opts.progress.reporter());

    let report = enhancer
        .span_enhance(plain, enhanced, &folder_path)
        .context("An error occurred during the enhancement process")?;

    println!(
        "Documents in {} enhanced and uploaded to corpora: {} (plain), {} (enhanced)",
        folder_path.display(),
        plain,
        enhanced
    );
    print_report(&report);
    Ok(())
}

pub fn run_process_and_upload(
    config_path: &Path,
    model_name: Option<String>,
    folder_path: Option<PathBuf>,
    opts: &SpanOptions,
) -> Result<()> {
    let (Some(model_name), Some(folder_path)) = (model_name, folder_path) else {
        println!("{}", usage::PROCESS_AND_UPLOAD);
        return Ok(());
    };
    if !check_folder(&folder_path) {
        return Ok(());
    }

    let (cfg, client) = connect(config_path)?;
    let mut enhancer = SpanEnhancer::new(
        &client,
        build_span(&cfg, &model_name, opts),
        enhance_options(&cfg, opts)?,
    )
    .with_progress(opts.progress.reporter());

    let report = enhancer
        .process_and_upload(&folder_path)
        .context("An error occurred during the enhancement process")?;

    println!(
        "Documents in {} enhanced and uploaded to corpora: {} (plain), {} (enhanced)",
        folder_path.display(),
        report.plain_corpus,
        report.enhanced_corpus
    );
    print_report(&report);
    Ok(())
}

fn print_report(report: &EnhanceReport) {
    println!("  documents uploaded: {}", report.documents_uploaded);
    println!("  documents enhanced: {}", report.documents_enhanced);
    println!("  chunks uploaded:    {}", report.chunks_uploaded);
    if !report.skipped_documents.is_empty() {
        println!(
            "  skipped:            {}",
            report.skipped_documents.join(", ")
        );
    }
    if !report.chunk_failures.is_empty() {
        println!("  chunk failures:     {}", report.chunk_failures.len());
        for f in &report.chunk_failures {
            println!(
                "    {} #{} ({}): {}",
                f.document_id, f.chunk_index, f.stage, f.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_override_and_zero_rejected() {
        let cfg = Config::default();
        let opts = SpanOptions {
            chunk_size: Some(128),
            ..SpanOptions::default()
        };
        assert_eq!(enhance_options(&cfg, &opts).unwrap().chunk_size, 128);
        assert_eq!(
            enhance_options(&cfg, &SpanOptions::default()).unwrap().chunk_size,
            512
        );

        let zero = SpanOptions {
            chunk_size: Some(0),
            ..SpanOptions::default()
        };
        assert!(enhance_options(&cfg, &zero).is_err());
    }

    #[test]
    fn test_model_type_flag_overrides_config() {
        let cfg = Config::default();
        let opts = SpanOptions {
            model_type: Some("spacy".to_string()),
            ..SpanOptions::default()
        };
        let mut span = build_span(&cfg, "multinerd", &opts);
        span.load_model().unwrap();

        let mut bad = build_span(
            &cfg,
            "multinerd",
            &SpanOptions {
                model_type: Some("flair".to_string()),
                ..SpanOptions::default()
            },
        );
        assert!(bad.load_model().is_err());
    }
}

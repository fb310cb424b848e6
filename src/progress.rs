//! Span-enhance progress reporting.
//!
//! Reports what the pipeline is doing so users can follow a long run.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a span-enhance run.
#[derive(Clone, Debug)]
pub enum EnhanceProgressEvent {
    /// Raw upload of the folder to the plain corpus has started.
    Uploading { folder: String },
    /// Chunks of document `n` of `total` are being enhanced.
    Enhancing {
        document: String,
        n: u64,
        total: u64,
        chunks: u64,
    },
}

/// Reports pipeline progress. Implementations write to stderr (human or JSON).
pub trait EnhanceProgressReporter {
    fn report(&self, event: EnhanceProgressEvent);
}

/// Human-friendly progress on stderr: "span-enhance  enhancing  3 / 12 documents  (doc.pdf, 4 chunks)".
pub struct StderrProgress;

impl EnhanceProgressReporter for StderrProgress {
    fn report(&self, event: EnhanceProgressEvent) {
        let line = match &event {
            EnhanceProgressEvent::Uploading { folder } => {
                format!("span-enhance  uploading  {}\n", folder)
            }
            EnhanceProgressEvent::Enhancing {
                document,
                n,
                total,
                chunks,
            } => format!(
                "span-enhance  enhancing  {} / {} documents  ({}, {} chunks)\n",
                format_number(*n),
                format_number(*total),
                document,
                chunks
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl EnhanceProgressReporter for JsonProgress {
    fn report(&self, event: EnhanceProgressEvent) {
        let obj = match &event {
            EnhanceProgressEvent::Uploading { folder } => serde_json::json!({
                "event": "progress",
                "phase": "uploading",
                "folder": folder
            }),
            EnhanceProgressEvent::Enhancing {
                document,
                n,
                total,
                chunks,
            } => serde_json::json!({
                "event": "progress",
                "phase": "enhancing",
                "document": document,
                "n": n,
                "total": total,
                "chunks": chunks
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl EnhanceProgressReporter for NoProgress {
    fn report(&self, _event: EnhanceProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn EnhanceProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

//! # Vectara CLI (`vectara`)
//!
//! Manages corpora on the Vectara corpus service, indexes and uploads
//! documents, runs searches, and runs the span-enhance pipeline that
//! re-indexes documents with named entities attached as metadata.
//!
//! ## Usage
//!
//! ```bash
//! vectara [--config ~/.vectara/config.toml] <command> [args]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vectara set-api-keys <customer_id> <api_key>` | Store credentials |
//! | `vectara create-corpus <id> <name> <description>` | Create a corpus with a requested id |
//! | `vectara create-corpus-advanced <name> <description>` | Create a corpus with full settings |
//! | `vectara delete-corpus <id>` | Delete a corpus |
//! | `vectara index-document <id> <doc_id> <title> <metadata> <text>` | Index a document |
//! | `vectara index-text <id> <doc_id> <text> [metadata]` | Index a piece of text |
//! | `vectara upload-document <id> <file>` | Upload one file |
//! | `vectara upload-folder <id> <folder>` | Upload every file in a folder |
//! | `vectara query <id> "<query>"` | Search a corpus |
//! | `vectara span-text <model> "<text>"` | Print entities found in text |
//! | `vectara span-enhance-folder <id1> <id2> <model> <folder>` | Plain + enhanced upload |
//! | `vectara process-and-upload <model> <folder>` | Same, creating both corpora first |
//!
//! A command called without its required arguments prints its usage and
//! exits 0.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use vectara_cli::config;
use vectara_cli::corpus_cmd::{self, CorpusOptions};
use vectara_cli::credentials::CredentialStore;
use vectara_cli::error::exit_code_for;
use vectara_cli::index_cmd::{self, IndexDocumentArgs};
use vectara_cli::progress::ProgressMode;
use vectara_cli::query_cmd;
use vectara_cli::span_cmd::{self, SpanOptions};

/// Vectara CLI: corpus management, indexing, search, and NER span
/// enhancement for the Vectara corpus service.
#[derive(Parser)]
#[command(
    name = "vectara",
    about = "Command-line client for the Vectara corpus service",
    version
)]
struct Cli {
    /// Path to the configuration file (TOML).
    ///
    /// Defaults to `$VECTARA_CONFIG`, then `~/.vectara/config.toml`, then
    /// `./vectara.toml`. Credentials written by `set-api-keys` live here too.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the customer id and API key.
    SetApiKeys {
        customer_id: Option<String>,
        api_key: Option<String>,
    },

    /// Create a corpus, requesting a specific id.
    CreateCorpus {
        corpus_id: Option<String>,
        name: Option<String>,
        description: Option<String>,
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Create a corpus with every service setting exposed.
    CreateCorpusAdvanced {
        name: Option<String>,
        description: Option<String>,
        #[command(flatten)]
        corpus: CorpusArgs,
        #[command(flatten)]
        advanced: AdvancedCorpusArgs,
    },

    /// Delete a corpus.
    DeleteCorpus { corpus_id: Option<String> },

    /// Index a document given its title, metadata, and text.
    IndexDocument {
        corpus_id: Option<String>,
        document_id: Option<String>,
        title: Option<String>,
        metadata_json: Option<String>,
        section_text: Option<String>,
    },

    /// Index one piece of text with optional JSON metadata.
    IndexText {
        corpus_id: Option<String>,
        document_id: Option<String>,
        text: Option<String>,
        metadata_json: Option<String>,
    },

    /// Upload a file for service-side extraction.
    UploadDocument {
        corpus_id: Option<String>,
        file_path: Option<PathBuf>,
    },

    /// Upload every file directly inside a folder.
    UploadFolder {
        corpus_id: Option<String>,
        folder_path: Option<PathBuf>,
    },

    /// Search a corpus.
    Query {
        corpus_id: Option<String>,
        query: Option<String>,
        /// Number of results to return.
        #[arg(long, default_value_t = 10)]
        num_results: u32,
        /// Metadata filter expression, e.g. `doc.lang = 'en'`.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Run NER over a piece of text and print the entities.
    SpanText {
        model_name: Option<String>,
        text: Option<String>,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Upload a folder to a plain corpus and its entity-enhanced chunks to a
    /// second corpus.
    SpanEnhanceFolder {
        corpus_id_1: Option<String>,
        corpus_id_2: Option<String>,
        model_name: Option<String>,
        folder_path: Option<PathBuf>,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Create a plain and an enhanced corpus, then enhance a folder into them.
    ProcessAndUpload {
        model_name: Option<String>,
        folder_path: Option<PathBuf>,
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// Custom dimensions as a JSON object of name → description.
    #[arg(long = "custom_dimensions", alias = "custom-dimensions", value_name = "JSON_STRING")]
    custom_dimensions: Option<String>,

    /// Filter attributes as a JSON object of name → description.
    #[arg(long = "filter_attributes", alias = "filter-attributes", value_name = "JSON_STRING")]
    filter_attributes: Option<String>,

    /// Public (true) or private (false).
    #[arg(long, action = ArgAction::Set, default_value_t = false, value_parser = BoolishValueParser::new(), value_name = "BOOLEAN")]
    public: bool,
}

#[derive(Args)]
struct AdvancedCorpusArgs {
    #[arg(long = "encoder_id", alias = "encoder-id", default_value_t = 1, value_name = "INT")]
    encoder_id: u64,

    #[arg(long = "metadata_max_bytes", alias = "metadata-max-bytes", default_value_t = 10_000, value_name = "INT")]
    metadata_max_bytes: u64,

    #[arg(long = "swap_qenc", alias = "swap-qenc", action = ArgAction::Set, default_value_t = false, value_parser = BoolishValueParser::new(), value_name = "BOOLEAN")]
    swap_qenc: bool,

    #[arg(long = "swap_ienc", alias = "swap-ienc", action = ArgAction::Set, default_value_t = false, value_parser = BoolishValueParser::new(), value_name = "BOOLEAN")]
    swap_ienc: bool,

    #[arg(long, action = ArgAction::Set, default_value_t = false, value_parser = BoolishValueParser::new(), value_name = "BOOLEAN")]
    textless: bool,

    #[arg(long, action = ArgAction::Set, default_value_t = true, value_parser = BoolishValueParser::new(), value_name = "BOOLEAN")]
    encrypted: bool,
}

#[derive(Args)]
struct SpanArgs {
    /// NER backend family: `span_marker` or `spacy`. Defaults to `span.model_type`.
    #[arg(long = "model-type", alias = "model_type")]
    model_type: Option<String>,

    /// Characters per chunk. Defaults to `span.chunk_size`.
    #[arg(long = "chunk-size", alias = "chunk_size")]
    chunk_size: Option<usize>,

    /// Progress on stderr: `off`, `human`, or `json`. Human when stderr is a TTY.
    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,
}

impl CorpusArgs {
    fn into_options(self) -> CorpusOptions {
        CorpusOptions {
            custom_dimensions: self.custom_dimensions,
            filter_attributes: self.filter_attributes,
            public: self.public,
            ..CorpusOptions::default()
        }
    }
}

impl SpanArgs {
    fn into_options(self) -> SpanOptions {
        SpanOptions {
            model_type: self.model_type,
            chunk_size: self.chunk_size,
            progress: self.progress.unwrap_or_else(ProgressMode::default_for_tty),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vectara=debug,vectara_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = config::resolve_config_path(cli.config.as_deref());

    // Commands that don't read the config
    match cli.command {
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "vectara", &mut std::io::stdout());
            Ok(())
        }
        Commands::SetApiKeys {
            customer_id,
            api_key,
        } => corpus_cmd::run_set_api_keys(&CredentialStore::new(&config_path), customer_id, api_key),
        // The rest load it once their arguments are complete
        command => dispatch(command, &config_path),
    }
}

fn dispatch(command: Commands, config_path: &Path) -> anyhow::Result<()> {
    match command {
        Commands::CreateCorpus {
            corpus_id,
            name,
            description,
            corpus,
        } => corpus_cmd::run_create_corpus(
            config_path,
            corpus_id,
            name,
            description,
            &corpus.into_options(),
        ),
        Commands::CreateCorpusAdvanced {
            name,
            description,
            corpus,
            advanced,
        } => {
            let opts = CorpusOptions {
                encoder_id: advanced.encoder_id,
                metadata_max_bytes: advanced.metadata_max_bytes,
                swap_qenc: advanced.swap_qenc,
                swap_ienc: advanced.swap_ienc,
                textless: advanced.textless,
                encrypted: advanced.encrypted,
                ..corpus.into_options()
            };
            corpus_cmd::run_create_corpus_advanced(config_path, name, description, &opts)
        }
        Commands::DeleteCorpus { corpus_id } => corpus_cmd::run_delete_corpus(config_path, corpus_id),
        Commands::IndexDocument {
            corpus_id,
            document_id,
            title,
            metadata_json,
            section_text,
        } => index_cmd::run_index_document(
            config_path,
            IndexDocumentArgs {
                corpus_id,
                document_id,
                title,
                metadata_json,
                section_text,
            },
        ),
        Commands::IndexText {
            corpus_id,
            document_id,
            text,
            metadata_json,
        } => index_cmd::run_index_text(config_path, corpus_id, document_id, text, metadata_json),
        Commands::UploadDocument {
            corpus_id,
            file_path,
        } => index_cmd::run_upload_document(config_path, corpus_id, file_path),
        Commands::UploadFolder {
            corpus_id,
            folder_path,
        } => index_cmd::run_upload_folder(config_path, corpus_id, folder_path),
        Commands::Query {
            corpus_id,
            query,
            num_results,
            filter,
        } => query_cmd::run_query(config_path, corpus_id, query, num_results, filter),
        Commands::SpanText {
            model_name,
            text,
            span,
        } => span_cmd::run_span_text(config_path, model_name, text, &span.into_options()),
        Commands::SpanEnhanceFolder {
            corpus_id_1,
            corpus_id_2,
            model_name,
            folder_path,
            span,
        } => span_cmd::run_span_enhance_folder(
            config_path,
            corpus_id_1,
            corpus_id_2,
            model_name,
            folder_path,
            &span.into_options(),
        ),
        Commands::ProcessAndUpload {
            model_name,
            folder_path,
            span,
        } => span_cmd::run_process_and_upload(
            config_path,
            model_name,
            folder_path,
            &span.into_options(),
        ),
        Commands::Completions { .. } | Commands::SetApiKeys { .. } => Ok(()),
    }
}

//! # vectara-cli
//!
//! Command-line client for the Vectara corpus service, with an optional
//! named-entity "span enhancement" pass before re-indexing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────────┐
//! │   CLI    │──▶│  Credential  │   │  Corpus service │
//! │ vectara  │   │    store     │   │   (REST v1)     │
//! └────┬─────┘   └──────────────┘   └────────▲────────┘
//!      │                                     │
//!      │         ┌──────────────┐            │
//!      └────────▶│ Span-enhance │────────────┤
//!                │   pipeline   │            │
//!                └──────┬───────┘            │
//!                       ▼                    │
//!                ┌──────────────┐   ┌────────┴────────┐
//!                │ NER adapter  │   │  VectaraClient  │
//!                └──────────────┘   └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vectara set-api-keys 1234567 zqt_xxx
//! vectara create-corpus-advanced "Papers" "Research papers" --public false
//! vectara span-enhance-folder 11 12 multinerd ./docs
//! vectara query 12 "who founded the company?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | Error taxonomy and exit codes |
//! | [`config`] | TOML configuration parsing |
//! | [`credentials`] | Credential store |
//! | [`models`] | Wire and data types |
//! | [`client`] | Corpus service client |
//! | [`folder`] | Folder scan and bulk upload |
//! | [`chunk`] | Text chunking |
//! | [`ner`] | Entity extraction adapter |
//! | [`enhance`] | Span-enhance pipeline |
//! | [`progress`] | Pipeline progress reporting |
//! | [`usage`] | Usage texts |

pub mod chunk;
pub mod client;
pub mod config;
pub mod corpus_cmd;
pub mod credentials;
pub mod enhance;
pub mod error;
pub mod folder;
pub mod index_cmd;
pub mod models;
pub mod ner;
pub mod progress;
pub mod query_cmd;
pub mod span_cmd;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

//! `query` command: search one corpus and print ranked passages.

use std::path::Path;

use anyhow::{Context, Result};

use crate::client::{connect, CorpusService};
use crate::models::{parse_corpus_id, QueryHit, QueryRequest};
use crate::usage;

pub fn run_query(
    config_path: &Path,
    corpus_id: Option<String>,
    query: Option<String>,
    num_results: u32,
    filter: Option<String>,
) -> Result<()> {
    let (Some(corpus_id), Some(query)) = (corpus_id, query) else {
        println!("{}", usage::QUERY);
        return Ok(());
    };
    let request = QueryRequest {
        corpus_id: parse_corpus_id(&corpus_id)?,
        query,
        start: 0,
        num_results,
        metadata_filter: filter,
    };

    let (_, client) = connect(config_path)?;
    let hits = search(&client, &request)?;
    print_hits(&hits);
    Ok(())
}

fn search(service: &dyn CorpusService, request: &QueryRequest) -> Result<Vec<QueryHit>> {
    service
        .query(request)
        .with_context(|| format!("query against corpus {} failed", request.corpus_id))
}

fn print_hits(hits: &[QueryHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, hit.score, hit.text);
        if let Some(doc) = &hit.document_id {
            println!("    document: {}", doc);
        }
        for (name, value) in &hit.metadata {
            println!("    {}: {}", name, value);
        }
        println!();
    }
}

//! Fixed-size text chunker.
//!
//! Splits extracted document text into contiguous [`Chunk`]s of exactly
//! `chunk_size` characters, in order, with no overlap. Only the last chunk
//! may be shorter. Sizes are counted in Unicode scalar values, so a chunk
//! never splits a multi-byte character.

/// Default chunk length in characters, sized for NER model input limits.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// A contiguous slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
}

/// Split text into chunks of `chunk_size` characters.
///
/// Empty text yields no chunks. Concatenating the returned chunk texts in
/// order reproduces `text` exactly.
///
/// # Panics
///
/// Panics if `chunk_size` is zero; config validation rejects that earlier.
pub fn chunk_text(document_id: &str, text: &str, chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size > 0, "chunk_size must be > 0");

    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;

    for (pos, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(make_chunk(document_id, chunks.len(), &text[start..pos]));
            start = pos;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(make_chunk(document_id, chunks.len(), &text[start..]));
    }

    chunks
}

fn make_chunk(document_id: &str, index: usize, text: &str) -> Chunk {
    Chunk {
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
    }
}

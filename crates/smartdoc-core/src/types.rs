//! Domain types shared by the ingest, vector, llm and session crates.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Text extracted from a single PDF page. `page` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// A processed upload.
///
/// `id` is the hex BLAKE3 digest of the uploaded bytes, so the same file
/// uploaded twice maps to the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub byte_len: usize,
    pub page_count: usize,
}

/// A chunk of a source document that is independently indexed.
///
/// - `id`: `<doc_id>:<chunk_index>`
/// - `doc_id`: fingerprint of the parent document
/// - `source`: display name of the parent document
/// - `page`: page the chunk was cut from
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub page: u32,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl DocumentChunk {
    /// Provenance label rendered next to the chunk in prompts.
    pub fn provenance(&self) -> String {
        format!("{}, page {}", self.source, self.page)
    }
}

/// The minimal surface returned by vector stores.
///
/// `id` matches `DocumentChunk::id`. Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
}

/// A chunk resolved from a `SearchHit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// One recorded question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

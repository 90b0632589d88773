//! smartdoc-vector
//!
//! One `DocumentIndex` per processed document: the chunks plus a vector store
//! holding their embeddings. Two stores implement `VectorIndexer`:
//! `FlatIndex` (in-memory, exact) and `LanceDbIndexer` (LanceDB table in a
//! private temporary directory).

use anyhow::{anyhow, ensure, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use smartdoc_core::config::IndexBackendKind;
use smartdoc_core::traits::{Embedder, VectorIndexer};
use smartdoc_core::types::{ChunkId, DocumentChunk, RetrievedChunk};

pub mod flat;
pub mod schema;
pub mod search;
pub mod writer;

pub use flat::FlatIndex;
pub use writer::LanceDbIndexer;

/// Fresh, empty store of the requested kind.
pub fn open_store(kind: IndexBackendKind, dim: usize) -> Result<Box<dyn VectorIndexer>> {
    Ok(match kind {
        IndexBackendKind::Flat => Box::new(FlatIndex::new(dim)),
        IndexBackendKind::LanceDb => Box::new(LanceDbIndexer::in_temp_dir(dim)?),
    })
}

pub struct DocumentIndex {
    chunks: Vec<DocumentChunk>,
    positions: HashMap<ChunkId, usize>,
    store: Box<dyn VectorIndexer>,
    embedder: Arc<dyn Embedder>,
}

impl DocumentIndex {
    /// Embed every chunk and load the vectors into a new store.
    pub fn build(chunks: Vec<DocumentChunk>, embedder: Arc<dyn Embedder>, backend: IndexBackendKind) -> Result<Self> {
        ensure!(!chunks.is_empty(), "cannot build an index from zero chunks");
        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).context("failed to embed chunks")?;
        ensure!(embeddings.len() == chunks.len(), "embedder returned {} vectors for {} chunks", embeddings.len(), chunks.len());

        let store = open_store(backend, embedder.dim())?;
        store.index(&chunks, &embeddings).context("failed to load vectors into the store")?;
        let positions = chunks.iter().enumerate().map(|(i, c)| (c.id.clone(), i)).collect();
        info!(chunks = chunks.len(), ?backend, ms = start.elapsed().as_millis() as u64, "built document index");
        Ok(Self { chunks, positions, store, embedder })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Top `k` chunks for `question`, best first. No similarity floor.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let k = k.min(self.chunks.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed_batch(&[question.to_string()])
            .context("failed to embed question")?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector for the question"))?;
        let hits = self.store.search_vec(&query_vec, k)?;
        debug!(k, hits = hits.len(), "retrieved chunks");
        hits.into_iter()
            .map(|hit| {
                let pos = *self.positions.get(&hit.id).ok_or_else(|| anyhow!("store returned unknown chunk id {}", hit.id))?;
                Ok(RetrievedChunk { chunk: self.chunks[pos].clone(), score: hit.score })
            })
            .collect()
    }
}

use anyhow::{anyhow, ensure, Result};
use std::sync::RwLock;

use smartdoc_core::traits::VectorIndexer;
use smartdoc_core::types::{ChunkId, DocumentChunk, SearchHit};

/// Exact in-memory cosine search. Ties keep insertion order.
pub struct FlatIndex {
    dim: usize,
    rows: RwLock<Vec<(ChunkId, Vec<f32>)>>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, rows: RwLock::new(Vec::new()) }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl VectorIndexer for FlatIndex {
    fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
        ensure!(chunks.len() == embeddings.len(), "chunks and embeddings length must match ({} vs {})", chunks.len(), embeddings.len());
        let mut rows = self.rows.write().map_err(|_| anyhow!("flat index lock poisoned"))?;
        for (chunk, vector) in chunks.iter().zip(embeddings) {
            ensure!(vector.len() == self.dim, "vector for {} has {} dims, expected {}", chunk.id, vector.len(), self.dim);
            rows.push((chunk.id.clone(), vector.clone()));
        }
        Ok(())
    }

    fn search_vec(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        ensure!(q_vec.len() == self.dim, "query has {} dims, index expects {}", q_vec.len(), self.dim);
        let rows = self.rows.read().map_err(|_| anyhow!("flat index lock poisoned"))?;
        let mut hits: Vec<SearchHit> = rows.iter().map(|(id, v)| SearchHit { id: id.clone(), score: cosine(q_vec, v) }).collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

use crate::types::{DocumentChunk, SearchHit};

/// Maps text to L2-normalised vectors of a fixed dimension.
///
/// Chunking, indexing and querying must share one implementation so that
/// similarity scores stay comparable.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

pub trait VectorIndexer: Send + Sync {
    fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// A generative model that turns one fully rendered prompt into one completion.
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

//! Semantic chunking.
//!
//! Boundaries follow embedding discontinuities instead of a fixed size:
//! sentences are embedded together with their neighbours, the cosine
//! distance between consecutive windows is measured, and a chunk ends after
//! every sentence whose distance to the next exceeds the configured
//! percentile of all distances on the page. Chunks never cross pages.

use anyhow::{ensure, Context, Result};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use smartdoc_core::config::ChunkingSettings;
use smartdoc_core::traits::Embedder;
use smartdoc_core::types::{Document, DocumentChunk, PageText};

pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    config: ChunkingSettings,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>, config: ChunkingSettings) -> Self {
        Self { embedder, config }
    }

    /// Split one block of text into topically coherent passages.
    pub fn split_text(&self, text: &str) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences.into_iter().map(str::to_string).collect());
        }

        let combined = combine_sentences(&sentences, self.config.buffer_size);
        let embeddings = self.embedder.embed_batch(&combined).context("failed to embed sentence windows")?;
        ensure!(
            embeddings.len() == combined.len(),
            "embedder returned {} vectors for {} sentence windows",
            embeddings.len(),
            combined.len()
        );

        let distances = cosine_distances(&embeddings);
        let threshold = percentile(&distances, self.config.breakpoint_percentile).unwrap_or(f64::INFINITY);
        let cuts = breakpoints(&distances, threshold);
        debug!(sentences = sentences.len(), threshold, cuts = cuts.len(), "split text");

        let mut chunks = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts {
            chunks.push(sentences[start..=cut].join(" "));
            start = cut + 1;
        }
        if start < sentences.len() {
            chunks.push(sentences[start..].join(" "));
        }
        Ok(chunks)
    }

    /// Chunk every page of `document`, numbering chunks across the whole document.
    pub fn chunk_document(&self, document: &Document, pages: &[PageText]) -> Result<Vec<DocumentChunk>> {
        let mut chunks = Vec::new();
        for page in pages.iter().filter(|p| !p.text.trim().is_empty()) {
            for content in self.split_text(&page.text).with_context(|| format!("failed to chunk page {}", page.page))? {
                let chunk_index = chunks.len();
                chunks.push(DocumentChunk {
                    id: format!("{}:{}", document.id, chunk_index),
                    doc_id: document.id.clone(),
                    source: document.name.clone(),
                    page: page.page,
                    content,
                    chunk_index,
                    total_chunks: 0,
                });
            }
        }
        let total_chunks = chunks.len();
        for chunk in &mut chunks { chunk.total_chunks = total_chunks; }
        info!(document = %document.name, pages = pages.len(), chunks = total_chunks, "chunked document");
        Ok(chunks)
    }
}

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.?!]\s+").expect("static regex"))
}

/// Split at whitespace that follows `.`, `?` or `!`, keeping the punctuation.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end().find_iter(text) {
        // the terminator is a single ASCII byte
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);
    sentences.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Each sentence joined with up to `buffer` neighbours on either side.
pub fn combine_sentences(sentences: &[&str], buffer: usize) -> Vec<String> {
    (0..sentences.len())
        .map(|i| {
            let lo = i.saturating_sub(buffer);
            let hi = (i + buffer + 1).min(sentences.len());
            sentences[lo..hi].join(" ")
        })
        .collect()
}

/// `1 - cosine` between each pair of consecutive vectors.
pub fn cosine_distances(embeddings: &[Vec<f32>]) -> Vec<f32> {
    embeddings.windows(2).map(|w| 1.0 - cosine_similarity(&w[0], &w[1])).collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f32], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().map(|v| f64::from(*v)).collect();
    sorted.sort_by(f64::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Indices of sentences after which a new chunk starts.
pub fn breakpoints(distances: &[f32], threshold: f64) -> Vec<usize> {
    distances
        .iter()
        .enumerate()
        .filter(|(_, d)| f64::from(**d) > threshold)
        .map(|(i, _)| i)
        .collect()
}

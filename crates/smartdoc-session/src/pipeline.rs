use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use smartdoc_core::config::{IndexBackendKind, Settings};
use smartdoc_core::error::{Error, Result};
use smartdoc_core::traits::{Embedder, Generator};
use smartdoc_core::types::{Document, RetrievedChunk};
use smartdoc_embed::embedder_from_settings;
use smartdoc_ingest::{DocumentIngestor, SemanticChunker};
use smartdoc_llm::{AnswerSynthesizer, OllamaGenerator};
use smartdoc_vector::DocumentIndex;

/// The stages between an uploaded file and an answer, wired from settings.
///
/// Stateless: the session owns the document and index, the pipeline only
/// knows how to build and query them. Each stage's failure is mapped to its
/// error kind here.
pub struct Pipeline {
    ingestor: DocumentIngestor,
    chunker: SemanticChunker,
    embedder: Arc<dyn Embedder>,
    backend: IndexBackendKind,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl Pipeline {
    pub fn new(settings: &Settings, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            ingestor: DocumentIngestor::from_settings(&settings.ingest),
            chunker: SemanticChunker::new(embedder.clone(), settings.chunking.clone()),
            embedder,
            backend: settings.index.backend,
            synthesizer: AnswerSynthesizer::new(generator),
            top_k: settings.retrieval.top_k,
        })
    }

    /// Local embedder per `embedding.*` and an Ollama generator per `llm.*`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder = embedder_from_settings(&settings.embedding).map_err(Error::retrieval)?;
        let generator = OllamaGenerator::from_settings(&settings.llm).map_err(Error::synthesis)?;
        Self::new(settings, embedder, Arc::new(generator))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn model_id(&self) -> &str {
        self.synthesizer.model_id()
    }

    pub fn backend(&self) -> IndexBackendKind {
        self.backend
    }

    pub fn scratch_dir(&self) -> &Path {
        self.ingestor.scratch_dir()
    }

    /// Extract, chunk, embed and index one upload.
    pub fn process(&self, name: &str, bytes: &[u8], fingerprint: String) -> Result<(Document, DocumentIndex)> {
        let start = Instant::now();
        let pages = self.ingestor.ingest(name, bytes).map_err(Error::ingestion)?;
        let document = Document { id: fingerprint, name: name.to_string(), byte_len: bytes.len(), page_count: pages.len() };

        let chunks = self.chunker.chunk_document(&document, &pages).map_err(Error::retrieval)?;
        if chunks.is_empty() {
            return Err(Error::Ingestion(format!("'{name}' has no extractable text")));
        }
        let index = DocumentIndex::build(chunks, self.embedder.clone(), self.backend).map_err(Error::retrieval)?;
        info!(
            document = %document.name,
            pages = document.page_count,
            chunks = index.len(),
            ms = start.elapsed().as_millis() as u64,
            "processed document"
        );
        Ok((document, index))
    }

    pub fn retrieve(&self, index: &DocumentIndex, question: &str) -> Result<Vec<RetrievedChunk>> {
        index.retrieve(question, self.top_k).map_err(Error::retrieval)
    }

    pub fn answer(&self, question: &str, passages: &[RetrievedChunk]) -> Result<String> {
        self.synthesizer.synthesize(question, passages).map_err(Error::synthesis)
    }
}

//! smartdoc-ingest
//!
//! Turns an uploaded PDF into page text (`pdf`) and page text into
//! semantically coherent chunks (`chunker`).

pub mod chunker;
pub mod pdf;

pub use chunker::SemanticChunker;
pub use pdf::DocumentIngestor;

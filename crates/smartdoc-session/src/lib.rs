//! smartdoc-session
//!
//! A `Session` holds one processed document, its index and the question
//! history. Uploads move it from `Empty` through `Processing` to `Ready`;
//! questions are only answered once it is `Ready`.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use smartdoc_core::error::{Error, Result};
use smartdoc_core::types::{Document, Exchange};
use smartdoc_vector::DocumentIndex;

pub mod pipeline;

pub use pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Processing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Processed { pages: usize, chunks: usize },
    /// Same bytes as the current document; nothing was redone.
    Unchanged,
}

struct Loaded {
    document: Document,
    index: DocumentIndex,
}

pub struct Session {
    pipeline: Pipeline,
    state: SessionState,
    loaded: Option<Loaded>,
    history: Vec<Exchange>,
}

pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Name a document is shown under: the file name, or the whole path if it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl Session {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline, state: SessionState::Empty, loaded: None, history: Vec::new() }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn document(&self) -> Option<&Document> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn chunk_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.index.len())
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn latest(&self) -> Option<&Exchange> {
        self.history.last()
    }

    /// Process an uploaded PDF, replacing any previous document.
    ///
    /// On failure the session is left exactly as it was before the call.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<UploadOutcome> {
        let id = fingerprint(bytes);
        if self.state == SessionState::Ready && self.document().is_some_and(|d| d.id == id) {
            debug!(document = name, "same document uploaded again; skipping");
            return Ok(UploadOutcome::Unchanged);
        }

        let previous = self.state;
        self.transition(SessionState::Processing);
        match self.pipeline.process(name, bytes, id) {
            Ok((document, index)) => {
                let outcome = UploadOutcome::Processed { pages: document.page_count, chunks: index.len() };
                if let Some(old) = self.loaded.replace(Loaded { document, index }) {
                    debug!(document = %old.document.name, "released previous document");
                }
                self.transition(SessionState::Ready);
                Ok(outcome)
            }
            Err(err) => {
                warn!(document = name, kind = err.kind(), error = %err, "upload failed");
                self.transition(previous);
                Err(err)
            }
        }
    }

    /// Read `path` and upload it under its file name. Unreadable files are `Error::Io`.
    pub fn upload_file(&mut self, path: &Path) -> Result<UploadOutcome> {
        let bytes = std::fs::read(path)?;
        self.upload(&display_name(path), &bytes)
    }

    /// Answer `question` from the current document and record the exchange.
    ///
    /// Blank questions are ignored and return `Ok(None)`.
    pub fn ask(&mut self, question: &str) -> Result<Option<&Exchange>> {
        let loaded = match (&self.loaded, self.state) {
            (Some(loaded), SessionState::Ready) => loaded,
            _ => return Err(Error::NotReady),
        };
        if question.trim().is_empty() {
            return Ok(None);
        }

        let start = Instant::now();
        let passages = self.pipeline.retrieve(&loaded.index, question)?;
        let answer = self.pipeline.answer(question, &passages)?;
        info!(passages = passages.len(), ms = start.elapsed().as_millis() as u64, "answered question");

        self.history.push(Exchange { question: question.to_string(), answer });
        Ok(self.history.last())
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "session state");
            self.state = next;
        }
    }
}

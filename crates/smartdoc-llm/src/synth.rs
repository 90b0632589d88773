use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use smartdoc_core::traits::Generator;
use smartdoc_core::types::RetrievedChunk;

use crate::prompt::render_prompt;

/// Renders the QA prompt and hands it to the model.
///
/// The prompt asks for short, context-only answers; nothing here checks that
/// the model complied.
pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub fn model_id(&self) -> &str {
        self.generator.model_id()
    }

    pub fn synthesize(&self, question: &str, passages: &[RetrievedChunk]) -> Result<String> {
        let prompt = render_prompt(question, passages);
        debug!(passages = passages.len(), prompt_chars = prompt.len(), "rendered prompt");
        let answer = self
            .generator
            .generate(&prompt)
            .with_context(|| format!("model '{}' failed", self.generator.model_id()))?;
        Ok(answer.trim().to_string())
    }
}

//! smartdoc-llm
//!
//! Prompt rendering, the Ollama client and the answer synthesizer that ties
//! them together.

pub mod ollama;
pub mod prompt;
pub mod synth;

pub use ollama::OllamaGenerator;
pub use synth::AnswerSynthesizer;

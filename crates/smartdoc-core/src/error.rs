use thiserror::Error;

/// Failure kinds surfaced by a session.
///
/// Component crates work with `anyhow` internally; the session boundary
/// classifies each stage into one of these so callers can tell an unreadable
/// upload from an unreachable model runtime.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("No document has been processed yet")]
    NotReady,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn ingestion(err: impl std::fmt::Display) -> Self {
        Self::Ingestion(format!("{err:#}"))
    }

    pub fn retrieval(err: impl std::fmt::Display) -> Self {
        Self::Retrieval(format!("{err:#}"))
    }

    pub fn synthesis(err: impl std::fmt::Display) -> Self {
        Self::Synthesis(format!("{err:#}"))
    }

    /// Short label for logs and status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingestion(_) => "ingestion",
            Self::Retrieval(_) => "retrieval",
            Self::Synthesis(_) => "synthesis",
            Self::NotReady => "not-ready",
            Self::InvalidConfig(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

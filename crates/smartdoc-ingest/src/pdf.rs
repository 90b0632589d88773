use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use smartdoc_core::config::IngestSettings;
use smartdoc_core::types::PageText;

const PDF_MAGIC: &[u8] = b"%PDF-";
/// Readers tolerate leading junk before the header within this many bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Stages uploads on disk and extracts their text page by page.
///
/// The extraction library reads from a path, so every upload is written to a
/// temporary file inside `scratch_dir`. The file is owned by a
/// `NamedTempFile` and disappears when `ingest` returns, whether extraction
/// succeeded or not.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    scratch_dir: PathBuf,
}

impl DocumentIngestor {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self { scratch_dir: scratch_dir.into() }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.scratch_path())
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<PageText>> {
        ensure_pdf(file_name, bytes)?;
        std::fs::create_dir_all(&self.scratch_dir)
            .with_context(|| format!("failed to create scratch dir {}", self.scratch_dir.display()))?;

        let mut staged = tempfile::Builder::new()
            .prefix("smartdoc-upload-")
            .suffix(".pdf")
            .tempfile_in(&self.scratch_dir)
            .context("failed to create staging file")?;
        staged.write_all(bytes).context("failed to stage upload")?;
        staged.flush()?;
        debug!(path = %staged.path().display(), bytes = bytes.len(), "staged upload");

        let pages = extract_pages(staged.path());
        staged.close().context("failed to remove staged upload")?;
        let pages = pages.with_context(|| format!("could not read '{file_name}'"))?;

        info!(file = file_name, pages = pages.len(), "extracted PDF text");
        Ok(pages)
    }
}

/// Accepts only `*.pdf` names whose first 1024 bytes carry the PDF header.
pub fn ensure_pdf(file_name: &str, bytes: &[u8]) -> Result<()> {
    let is_pdf_name = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        bail!("'{file_name}' is not a PDF file");
    }
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        bail!("'{file_name}' has no PDF header");
    }
    Ok(())
}

fn extract_pages(path: &Path) -> Result<Vec<PageText>> {
    let doc = lopdf::Document::load(path).context("malformed PDF")?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        bail!("PDF contains no pages");
    }
    let mut out = Vec::with_capacity(pages.len());
    for page in pages.keys().copied() {
        let text = match doc.extract_text(&[page]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(page, error = %e, "no text extracted from page");
                String::new()
            }
        };
        out.push(PageText { page, text });
    }
    Ok(out)
}

mod common;

use std::sync::Arc;

use smartdoc_core::config::ChunkingSettings;
use smartdoc_core::types::{Document, PageText};
use smartdoc_embed::FakeEmbedder;
use smartdoc_ingest::{DocumentIngestor, SemanticChunker};
use tempfile::TempDir;

fn scratch_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).expect("read scratch").next().is_none()
}

#[test]
fn extracts_one_entry_per_page_in_order() {
    let scratch = TempDir::new().unwrap();
    let bytes = common::pdf_with_pages(&[&["Alpha page text."], &["Bravo page text."], &["Charlie page text."]]);

    let ingestor = DocumentIngestor::new(scratch.path());
    let pages = ingestor.ingest("three.pdf", &bytes).expect("ingest");

    assert_eq!(pages.len(), 3);
    assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(pages[0].text.contains("Alpha"), "page 1 text: {:?}", pages[0].text);
    assert!(pages[2].text.contains("Charlie"), "page 3 text: {:?}", pages[2].text);
    assert!(scratch_is_empty(&scratch), "staged upload removed after success");
}

#[test]
fn corrupt_pdf_fails_and_leaves_no_staged_file() {
    let scratch = TempDir::new().unwrap();
    let ingestor = DocumentIngestor::new(scratch.path());

    let err = ingestor.ingest("broken.pdf", b"%PDF-1.4\nthis is not really a pdf").unwrap_err();
    assert!(format!("{err:#}").contains("broken.pdf"));
    assert!(scratch_is_empty(&scratch), "staged upload removed after failure");
}

#[test]
fn non_pdf_is_rejected_before_touching_disk() {
    let scratch = TempDir::new().unwrap();
    let nested = scratch.path().join("uploads");
    let ingestor = DocumentIngestor::new(&nested);

    assert!(ingestor.ingest("notes.txt", b"plain text").is_err());
    assert!(!nested.exists(), "scratch dir not even created");
}

fn chunker() -> SemanticChunker {
    SemanticChunker::new(Arc::new(FakeEmbedder::new(512)), ChunkingSettings::default())
}

fn document() -> Document {
    Document { id: "doc1".into(), name: "manual.pdf".into(), byte_len: 0, page_count: 2 }
}

#[test]
fn chunks_stay_within_pages_and_are_numbered_across_document() {
    let pages = vec![
        PageText { page: 1, text: "Solar panels need cleaning. Dust reduces output. Clean them monthly.".into() },
        PageText { page: 2, text: "   ".into() },
        PageText { page: 3, text: "Goats eat hay.".into() },
    ];
    let chunks = chunker().chunk_document(&document(), &pages).expect("chunk");

    assert!(chunks.len() >= 2);
    let total = chunks.len();
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.chunk_index, i);
        assert_eq!(c.total_chunks, total);
        assert_eq!(c.id, format!("doc1:{i}"));
        assert_eq!(c.source, "manual.pdf");
        assert_ne!(c.page, 2, "blank page yields no chunk");
    }
    let last = chunks.last().unwrap();
    assert_eq!(last.page, 3);
    assert_eq!(last.content, "Goats eat hay.");
}

#[test]
fn chunking_preserves_every_sentence_in_order() {
    let text = "Water boils at one hundred degrees. Steam rises quickly. \
                Tax forms are due in April. Receipts must be kept. \
                Chickens lay eggs daily. Coops need straw.";
    let chunks = chunker().split_text(text).expect("split");
    assert!(chunks.len() >= 2, "a 95th percentile threshold always cuts at least once");
    let rejoined = chunks.join(" ");
    assert_eq!(rejoined, smartdoc_ingest::chunker::split_sentences(text).join(" "));
}

#[test]
fn single_sentence_is_one_chunk_without_embedding() {
    let chunks = chunker().split_text("Just one sentence here").expect("split");
    assert_eq!(chunks, vec!["Just one sentence here".to_string()]);
}

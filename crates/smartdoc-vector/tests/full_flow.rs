use std::sync::Arc;

use smartdoc_core::config::IndexBackendKind;
use smartdoc_core::traits::{Embedder, VectorIndexer};
use smartdoc_core::types::DocumentChunk;
use smartdoc_embed::FakeEmbedder;
use smartdoc_vector::{DocumentIndex, LanceDbIndexer};

fn chunks() -> Vec<DocumentChunk> {
    let texts = [
        "Rainwater barrels should be covered to keep mosquitoes out.",
        "The wood stove needs its chimney swept every autumn.",
        "Seed potatoes are planted after the last frost.",
        "The secret value X = 42 is written on the pump house door.",
        "Solar batteries last longer when kept above freezing.",
        "Fence posts rot quickly without treatment.",
    ];
    let total = texts.len();
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| DocumentChunk {
            id: format!("doc:{i}"),
            doc_id: "doc".into(),
            source: "homestead.pdf".into(),
            page: i as u32 + 1,
            content: t.to_string(),
            chunk_index: i,
            total_chunks: total,
        })
        .collect()
}

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(FakeEmbedder::new(1024))
}

fn check_backend(backend: IndexBackendKind) {
    let index = DocumentIndex::build(chunks(), embedder(), backend).expect("build");
    assert_eq!(index.len(), 6);

    let results = index.retrieve("What is X?", 3).expect("retrieve");
    assert_eq!(results.len(), 3, "always k results");
    assert!(results.iter().any(|r| r.chunk.content.contains("X = 42")), "{backend:?}: fact retrieved");
    for pair in results.windows(2) { assert!(pair[0].score >= pair[1].score); }

    let again = index.retrieve("What is X?", 3).expect("retrieve again");
    let ids = |v: &[smartdoc_core::types::RetrievedChunk]| v.iter().map(|r| r.chunk.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&results), ids(&again), "deterministic for an unchanged index");

    let all = index.retrieve("anything at all", 50).expect("retrieve all");
    assert_eq!(all.len(), 6, "k is capped at the number of chunks");
}

#[test]
fn flat_full_flow() {
    check_backend(IndexBackendKind::Flat);
}

#[test]
fn lancedb_full_flow() {
    check_backend(IndexBackendKind::LanceDb);
}

#[test]
fn empty_chunk_list_is_rejected() {
    assert!(DocumentIndex::build(Vec::new(), embedder(), IndexBackendKind::Flat).is_err());
}

#[test]
fn lancedb_directory_is_removed_on_drop() {
    let indexer = LanceDbIndexer::in_temp_dir(4).expect("open");
    let path = indexer.path().to_path_buf();
    let c = &chunks()[..1];
    indexer.index(c, &[vec![1.0, 0.0, 0.0, 0.0]]).expect("index");
    let hits = indexer.search_vec(&[1.0, 0.0, 0.0, 0.0], 1).expect("search");
    assert_eq!(hits[0].id, "doc:0");
    assert!(path.exists());
    drop(indexer);
    assert!(!path.exists(), "temporary LanceDB directory cleaned up");
}

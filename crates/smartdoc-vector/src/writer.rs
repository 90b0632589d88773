use anyhow::{Context, Result, ensure};
use lancedb::{connect, Connection};
use arrow_array::{RecordBatch, RecordBatchIterator, Int32Array, FixedSizeListArray, StringArray};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use smartdoc_core::types::DocumentChunk;
use crate::schema::{build_arrow_schema, CHUNKS_TABLE};

/// LanceDB-backed store for one document.
///
/// The table lives in a private temporary directory that is removed when the
/// indexer is dropped. LanceDB is async; the indexer owns a runtime so the
/// synchronous `VectorIndexer` surface can drive it.
pub struct LanceDbIndexer {
	pub(crate) db: Connection,
	pub(crate) table_name: String,
	pub(crate) dim: usize,
	pub(crate) rt: Runtime,
	dir: TempDir,
}

impl LanceDbIndexer {
	pub fn in_temp_dir(dim: usize) -> Result<Self> {
		let dir = tempfile::Builder::new().prefix("smartdoc-lance-").tempdir().context("failed to create LanceDB dir")?;
		let rt = Runtime::new().context("failed to start LanceDB runtime")?;
		let db = rt.block_on(async { connect(dir.path().to_string_lossy().as_ref()).execute().await })?;
		debug!(path = %dir.path().display(), dim, "opened LanceDB");
		Ok(Self { db, table_name: CHUNKS_TABLE.to_string(), dim, rt, dir })
	}

	pub fn path(&self) -> &Path { self.dir.path() }

	pub(crate) async fn insert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		ensure!(chunks.len() == embeddings.len(), "chunks and embeddings length must match ({} vs {})", chunks.len(), embeddings.len());
		if chunks.is_empty() { return Ok(()); }
		let record_batch = self.to_record_batch(chunks, embeddings)?; let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if self.db.table_names().execute().await?.contains(&self.table_name) {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		info!(rows = chunks.len(), table = %self.table_name, "indexed chunks into LanceDB");
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.dim).context("embedding dimension too large")?;
		let schema = build_arrow_schema(dim);
		let mut ids = Vec::new(); let mut doc_ids = Vec::new(); let mut sources = Vec::new(); let mut pages = Vec::new(); let mut contents = Vec::new(); let mut chunk_indices = Vec::new(); let mut total_chunks = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
		for (chunk, vector) in chunks.iter().zip(embeddings) {
			ensure!(vector.len() == self.dim, "vector for {} has {} dims, expected {}", chunk.id, vector.len(), self.dim);
			ids.push(chunk.id.clone()); doc_ids.push(chunk.doc_id.clone()); sources.push(chunk.source.clone()); pages.push(chunk.page as i32); contents.push(chunk.content.clone()); chunk_indices.push(chunk.chunk_index as i32); total_chunks.push(chunk.total_chunks as i32); vectors.push(Some(vector.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(doc_ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(Int32Array::from(pages)),
			Arc::new(StringArray::from(contents)),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(Int32Array::from(total_chunks)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
		])?;
		Ok(record_batch)
	}
}

use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, StringArray};
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{QueryBase, ExecutableQuery};

use smartdoc_core::traits::VectorIndexer;
use smartdoc_core::types::{DocumentChunk, SearchHit};

use crate::writer::LanceDbIndexer;

impl LanceDbIndexer {
	async fn search(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(q_vec.to_vec())?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
			let ids = batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("id column missing from search results"))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>()).ok_or_else(|| anyhow!("_distance column missing from search results"))?;
			for i in 0..batch.num_rows() {
				hits.push(SearchHit { id: ids.value(i).to_string(), score: 1.0 - distances.value(i) });
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}

impl VectorIndexer for LanceDbIndexer {
	fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		self.rt.block_on(self.insert(chunks, embeddings))
	}

	fn search_vec(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if q_vec.len() != self.dim { return Err(anyhow!("query has {} dims, index expects {}", q_vec.len(), self.dim)); }
		if k == 0 { return Ok(Vec::new()); }
		self.rt.block_on(self.search(q_vec, k))
	}
}

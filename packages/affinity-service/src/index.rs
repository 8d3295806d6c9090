use affinity_domain::{AffinityRecord, SubscoreSet, derive_metadata, extract_text};
use affinity_storage::IndexPoint;

use crate::{AffinityService, Error, Result};

/// Outcome of one indexing run. `indexed < total` means some batches were
/// dropped; that is reported, never raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexingSummary {
	pub total: usize,
	pub indexed: usize,
}

impl AffinityService {
	/// Embeds and upserts a cleaned record set in fixed-size batches.
	///
	/// Batches run strictly sequentially so the store never sees
	/// overlapping writes for the collection, and each batch fails in
	/// isolation: an embedding or upsert error drops that batch and the
	/// run moves on. Rebuilding a collection that is concurrently being
	/// searched is not safe; rebuild into a fresh collection name and
	/// repoint readers instead.
	pub async fn build_index(
		&self,
		records: &[AffinityRecord],
		subscores: &SubscoreSet,
		clear_first: bool,
	) -> Result<IndexingSummary> {
		self.store
			.ensure_collection(clear_first)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		let total = records.len();
		let batch_size = self.cfg.index.batch_size.max(1);
		let mut indexed = 0;

		tracing::info!(total, batch_size, "Indexing affinity records.");

		for (batch_index, batch) in records.chunks(batch_size).enumerate() {
			let texts: Vec<String> = batch.iter().map(extract_text).collect();
			let vectors =
				match self.embedding.embed(&self.cfg.providers.embedding, &texts).await {
					Ok(vectors) => vectors,
					Err(err) => {
						tracing::error!(
							batch = batch_index,
							size = batch.len(),
							error = %err,
							"Embedding failed for batch; skipping."
						);

						continue;
					},
				};

			if vectors.len() != batch.len()
				|| vectors
					.iter()
					.any(|vector| vector.len() != self.cfg.storage.qdrant.vector_dim as usize)
			{
				tracing::error!(
					batch = batch_index,
					size = batch.len(),
					"Embedding returned malformed vectors for batch; skipping."
				);

				continue;
			}

			let points: Vec<IndexPoint> = batch
				.iter()
				.zip(texts)
				.zip(vectors)
				.map(|((record, document), vector)| IndexPoint {
					concept: record.input_concept.clone(),
					document,
					vector,
					metadata: derive_metadata(record, subscores),
				})
				.collect();

			match self.store.upsert(points).await {
				Ok(()) => {
					indexed += batch.len();
					tracing::info!(indexed, total, "Indexed batch.");
				},
				Err(err) => {
					tracing::error!(
						batch = batch_index,
						size = batch.len(),
						error = %err,
						"Store upsert failed for batch."
					);
				},
			}
		}

		tracing::info!(total, indexed, "Index build finished.");

		Ok(IndexingSummary { total, indexed })
	}
}

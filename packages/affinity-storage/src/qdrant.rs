use qdrant_client::{
	Payload,
	qdrant::{
		CreateCollectionBuilder, Distance, PointId, PointStruct, Query, QueryPointsBuilder,
		ScrollPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
	},
};
use uuid::Uuid;

use affinity_domain::{MetadataFilter, MetadataRecord};

use crate::{Result, payload};

const SCROLL_PAGE: u32 = 256;

/// One document headed for the index: the concept key, the embeddable
/// text, its vector, and the derived metadata.
#[derive(Clone, Debug)]
pub struct IndexPoint {
	pub concept: String,
	pub document: String,
	pub vector: Vec<f32>,
	pub metadata: MetadataRecord,
}

/// One nearest-neighbor hit as returned by the store, in rank order.
/// Smaller distance means more similar; the collection uses a distance
/// metric, so scores come back ascending and are never inverted.
#[derive(Clone, Debug)]
pub struct ScoredHit {
	pub metadata: MetadataRecord,
	pub distance: f32,
	pub document: String,
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &affinity_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Prepares the collection for an indexing run. With `clear_first` an
	/// existing collection is deleted and recreated empty; otherwise an
	/// existing collection is reused and upserts overwrite by key.
	pub async fn ensure_collection(&self, clear_first: bool) -> Result<()> {
		let exists = self.client.collection_exists(self.collection.as_str()).await?;

		if exists && clear_first {
			tracing::info!(collection = %self.collection, "Clearing existing collection.");
			self.client.delete_collection(self.collection.as_str()).await?;
		}
		if !exists || clear_first {
			self.client
				.create_collection(
					CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
						VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Euclid),
					),
				)
				.await?;
		}

		Ok(())
	}

	/// Upserts one batch as a single call. Point ids are derived from the
	/// concept key, so re-indexing a concept replaces its prior entry.
	pub async fn upsert(&self, points: Vec<IndexPoint>) -> Result<()> {
		let points: Vec<PointStruct> = points
			.into_iter()
			.map(|point| {
				let payload = Payload::from(payload::encode(&point.metadata, &point.document));

				PointStruct::new(point_id(&point.concept).to_string(), point.vector, payload)
			})
			.collect();

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
			.await?;

		Ok(())
	}

	/// Nearest-neighbor query under an optional metadata filter. Results
	/// arrive ranked by the store, closest first.
	pub async fn nearest(
		&self,
		vector: Vec<f32>,
		filter: &MetadataFilter,
		limit: u64,
	) -> Result<Vec<ScoredHit>> {
		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(limit)
			.with_payload(true);

		if let Some(filter) = payload::qdrant_filter(filter) {
			query = query.filter(filter);
		}

		let response = self.client.query(query).await?;

		Ok(response
			.result
			.into_iter()
			.map(|point| ScoredHit {
				metadata: payload::decode(&point.payload),
				distance: point.score,
				document: payload::document(&point.payload),
			})
			.collect())
	}

	/// Full payload scan of the collection. O(collection size); intended
	/// for facet enumeration over small collections only.
	pub async fn scroll_metadata(&self) -> Result<Vec<MetadataRecord>> {
		let mut out = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(self.collection.clone())
				.limit(SCROLL_PAGE)
				.with_payload(true);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in response.result {
				out.push(payload::decode(&point.payload));
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(out)
	}
}

/// Deterministic point id for a concept key. The store only accepts
/// integer or UUID ids, so the natural string key maps to a v5 UUID;
/// the same concept always lands on the same point.
pub fn point_id(concept: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, concept.as_bytes())
}

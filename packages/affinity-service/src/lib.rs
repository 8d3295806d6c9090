mod assemble;
mod error;
mod index;
mod search;

#[cfg(test)]
pub(crate) mod test_support;

use std::{future::Future, pin::Pin, sync::Arc};

use affinity_config::{Config, EmbeddingProviderConfig};
use affinity_domain::{MetadataFilter, MetadataRecord};
use affinity_providers::embedding;
use affinity_storage::{IndexPoint, QdrantStore, ScoredHit};

pub use error::{Error, Result};
pub use index::IndexingSummary;
pub use search::{
	BatchEntry, BatchSearchRequest, BatchSearchResponse, FacetsResponse, Highlight, PagedResult,
	SearchFacets, SearchRequest, SearchResult,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Embedding model handle. The default implementation calls the remote
/// provider; tests inject doubles.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Vector store handle. Constructed once at startup and shared by all
/// requests; only the index builder mutates the collection, the query path
/// reads.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn ensure_collection(&self, clear_first: bool) -> BoxFuture<'_, color_eyre::Result<()>>;

	fn upsert(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, color_eyre::Result<()>>;

	fn nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		filter: &'a MetadataFilter,
		limit: u64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredHit>>>;

	fn scroll_metadata(&self) -> BoxFuture<'_, color_eyre::Result<Vec<MetadataRecord>>>;
}

pub struct AffinityService {
	pub cfg: Config,
	pub store: Arc<dyn VectorStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl AffinityService {
	pub fn new(cfg: Config, store: QdrantStore) -> Self {
		Self { cfg, store: Arc::new(store), embedding: Arc::new(DefaultEmbedding) }
	}

	pub fn with_backends(
		cfg: Config,
		store: Arc<dyn VectorStore>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { cfg, store, embedding }
	}
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl VectorStore for QdrantStore {
	fn ensure_collection(&self, clear_first: bool) -> BoxFuture<'_, color_eyre::Result<()>> {
		Box::pin(async move { Ok(QdrantStore::ensure_collection(self, clear_first).await?) })
	}

	fn upsert(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, color_eyre::Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, points).await?) })
	}

	fn nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		filter: &'a MetadataFilter,
		limit: u64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredHit>>> {
		Box::pin(async move { Ok(QdrantStore::nearest(self, vector, filter, limit).await?) })
	}

	fn scroll_metadata(&self) -> BoxFuture<'_, color_eyre::Result<Vec<MetadataRecord>>> {
		Box::pin(async move { Ok(QdrantStore::scroll_metadata(self).await?) })
	}
}

//! In-memory doubles for the store and embedding handles, plus config and
//! request builders shared by the unit tests.

use std::{
	collections::HashSet,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use color_eyre::eyre::eyre;
use serde_json::Map;

use affinity_config::{
	Config, EmbeddingProviderConfig, Index, Providers, Qdrant, Service, Storage,
};
use affinity_domain::{MetadataFilter, MetadataRecord};
use affinity_storage::{IndexPoint, ScoredHit};

use crate::{AffinityService, BoxFuture, EmbeddingProvider, SearchRequest, VectorStore};

/// Topic axes the fake embedding projects onto. Texts mentioning a topic
/// land on that axis; everything else shares the last axis.
const TOPIC_AXES: [&str; 2] = ["spa", "ocean"];

pub(crate) fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_allow_origin: None,
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "affinities_test".to_string(),
				vector_dim: 3,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:0".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-model".to_string(),
				dimensions: 3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		index: Index { batch_size: 2 },
	}
}

pub(crate) fn service(
	store: MemoryStore,
	embedding: StaticEmbedding,
) -> AffinityService {
	AffinityService::with_backends(test_config(), Arc::new(store), Arc::new(embedding))
}

pub(crate) fn search_request(query: &str) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		context: None,
		filter_status: Some("Active".to_string()),
		filter_lodging_type: None,
		filter_category: None,
		min_score: None,
		page: 1,
		per_page: 10,
	}
}

/// Deterministic embedding double: projects each text onto a topic axis.
/// Calls are counted so tests can fail a specific batch.
pub(crate) struct StaticEmbedding {
	pub dimensions: usize,
	fail_calls: Mutex<HashSet<usize>>,
	calls: AtomicUsize,
}

impl Default for StaticEmbedding {
	fn default() -> Self {
		Self { dimensions: 3, fail_calls: Mutex::new(HashSet::new()), calls: AtomicUsize::new(0) }
	}
}

impl StaticEmbedding {
	pub fn with_dimensions(dimensions: usize) -> Self {
		Self { dimensions, ..Default::default() }
	}

	pub fn fail_call(&self, call: usize) {
		self.fail_calls.lock().expect("lock").insert(call);
	}

	fn vector_for(&self, text: &str) -> Vec<f32> {
		let lower = text.to_lowercase();
		let axis = TOPIC_AXES
			.iter()
			.position(|topic| lower.contains(topic))
			.unwrap_or(self.dimensions.saturating_sub(1));
		let mut vector = vec![0.0; self.dimensions];

		if axis < self.dimensions {
			vector[axis] = 1.0;
		}

		vector
	}
}

impl EmbeddingProvider for StaticEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst);

			if self.fail_calls.lock().expect("lock").contains(&call) {
				return Err(eyre!("injected embedding failure for call {call}"));
			}

			Ok(texts.iter().map(|text| self.vector_for(text)).collect())
		})
	}
}

/// In-memory stand-in for the vector store: keyed upsert, euclidean
/// nearest-neighbor scan, in-process filter evaluation.
#[derive(Default)]
pub(crate) struct MemoryStore {
	points: Mutex<Vec<IndexPoint>>,
	fail_query: AtomicBool,
	fail_upsert_calls: Mutex<HashSet<usize>>,
	upsert_calls: AtomicUsize,
}

impl MemoryStore {
	pub fn fail_next_query(&self) {
		self.fail_query.store(true, Ordering::SeqCst);
	}

	pub fn fail_upsert_call(&self, call: usize) {
		self.fail_upsert_calls.lock().expect("lock").insert(call);
	}
}

impl VectorStore for MemoryStore {
	fn ensure_collection(&self, clear_first: bool) -> BoxFuture<'_, color_eyre::Result<()>> {
		Box::pin(async move {
			if clear_first {
				self.points.lock().expect("lock").clear();
			}

			Ok(())
		})
	}

	fn upsert(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, color_eyre::Result<()>> {
		Box::pin(async move {
			let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);

			if self.fail_upsert_calls.lock().expect("lock").contains(&call) {
				return Err(eyre!("injected upsert failure for call {call}"));
			}

			let mut stored = self.points.lock().expect("lock");

			for point in points {
				match stored.iter_mut().find(|existing| existing.concept == point.concept) {
					Some(existing) => *existing = point,
					None => stored.push(point),
				}
			}

			Ok(())
		})
	}

	fn nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		filter: &'a MetadataFilter,
		limit: u64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			if self.fail_query.swap(false, Ordering::SeqCst) {
				return Err(eyre!("injected query failure"));
			}

			let stored = self.points.lock().expect("lock");
			let mut hits: Vec<ScoredHit> = stored
				.iter()
				.filter(|point| filter.matches(&point.metadata))
				.map(|point| ScoredHit {
					metadata: point.metadata.clone(),
					distance: euclidean(&vector, &point.vector),
					document: point.document.clone(),
				})
				.collect();

			hits.sort_by(|a, b| {
				a.distance
					.partial_cmp(&b.distance)
					.unwrap_or(std::cmp::Ordering::Equal)
					.then_with(|| a.metadata.input_concept.cmp(&b.metadata.input_concept))
			});
			hits.truncate(limit as usize);

			Ok(hits)
		})
	}

	fn scroll_metadata(&self) -> BoxFuture<'_, color_eyre::Result<Vec<MetadataRecord>>> {
		Box::pin(async move {
			let stored = self.points.lock().expect("lock");

			Ok(stored.iter().map(|point| point.metadata.clone()).collect())
		})
	}
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
	let len = a.len().max(b.len());
	let mut sum = 0.0;

	for index in 0..len {
		let delta = a.get(index).copied().unwrap_or(0.0) - b.get(index).copied().unwrap_or(0.0);
		sum += delta * delta;
	}

	sum.sqrt()
}

use serde::{Deserialize, Serialize};

use affinity_domain::MetadataFilter;

use crate::{AffinityService, Error, Result, assemble};

#[derive(Clone, Debug, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default = "default_filter_status")]
	pub filter_status: Option<String>,
	#[serde(default)]
	pub filter_lodging_type: Option<String>,
	#[serde(default)]
	pub filter_category: Option<String>,
	#[serde(default)]
	pub min_score: Option<f64>,
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default = "default_per_page")]
	pub per_page: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchSearchRequest {
	pub queries: Vec<String>,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default = "default_filter_status")]
	pub filter_status: Option<String>,
	#[serde(default)]
	pub filter_lodging_type: Option<String>,
	#[serde(default)]
	pub filter_category: Option<String>,
	#[serde(default)]
	pub min_score: Option<f64>,
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default = "default_per_page")]
	pub per_page: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
	pub input_concept: String,
	pub category: String,
	pub definition: String,
	pub similarity_score: f64,
	pub platform_scores: Vec<String>,
	pub match_reason: Vec<String>,
	pub highlight: Highlight,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Highlight {
	pub input_concept: Option<String>,
	pub category: Option<String>,
	pub related_tags: Vec<String>,
	pub context: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PagedResult {
	pub message: String,
	pub results: Vec<SearchResult>,
	pub total: usize,
	pub page: u32,
	pub per_page: u32,
	pub facets: SearchFacets,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchFacets {
	pub categories: Vec<String>,
	pub platform_scores: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FacetsResponse {
	pub categories: Vec<String>,
	pub statuses: Vec<String>,
	pub lodging_types: Vec<String>,
}

/// One slot of a batch search. A failed sub-query keeps its slot so the
/// response stays aligned with the input query order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
	Result(PagedResult),
	Error { detail: String, error: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSearchResponse {
	pub results: Vec<BatchEntry>,
}

impl AffinityService {
	pub async fn search(&self, req: SearchRequest) -> Result<PagedResult> {
		if req.query.is_empty() {
			return Err(Error::InvalidRequest { message: "Empty query".to_string() });
		}

		let page = req.page.max(1);
		let per_page = req.per_page.max(1);

		// The query and optional context embed as one string so the
		// context steers the neighborhood, not just the explanation.
		let full_query = match req.context.as_deref().filter(|context| !context.is_empty()) {
			Some(context) => format!("{}. Context: {}", req.query, context),
			None => req.query.clone(),
		};

		let filter = MetadataFilter::new(
			req.filter_status.as_deref(),
			req.filter_lodging_type.as_deref(),
			req.filter_category.as_deref(),
		);

		let vector = self.embed_query(&full_query).await?;

		// Filtering and pagination happen after retrieval, so the store
		// must hand back enough candidates to cover the requested page.
		let candidate_count = u64::from(page) * u64::from(per_page);
		let hits = self
			.store
			.nearest(vector, &filter, candidate_count)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		Ok(assemble::assemble(
			&req.query,
			req.context.as_deref(),
			hits,
			req.min_score,
			page,
			per_page,
		))
	}

	/// Runs one search per query, sequentially and independently. A
	/// failing sub-query becomes an error entry in its slot; the batch
	/// itself only fails when the query list is empty.
	pub async fn batch_search(&self, req: BatchSearchRequest) -> Result<BatchSearchResponse> {
		if req.queries.is_empty() {
			return Err(Error::InvalidRequest { message: "No queries provided.".to_string() });
		}

		let mut results = Vec::with_capacity(req.queries.len());

		for query in &req.queries {
			let single = SearchRequest {
				query: query.clone(),
				context: req.context.clone(),
				filter_status: req.filter_status.clone(),
				filter_lodging_type: req.filter_lodging_type.clone(),
				filter_category: req.filter_category.clone(),
				min_score: req.min_score,
				page: req.page,
				per_page: req.per_page,
			};

			match self.search(single).await {
				Ok(paged) => results.push(BatchEntry::Result(paged)),
				Err(err) => {
					tracing::warn!(query = %query, error = %err, "Batch sub-query failed.");
					results.push(BatchEntry::Error {
						detail: "Sub-query failed.".to_string(),
						error: err.to_string(),
					});
				},
			}
		}

		Ok(BatchSearchResponse { results })
	}

	/// Enumerates filterable values across every stored record. Scans the
	/// whole collection; acceptable only while collections stay small.
	pub async fn facets(&self) -> Result<FacetsResponse> {
		let metadata = self
			.store
			.scroll_metadata()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		Ok(FacetsResponse {
			categories: assemble::distinct_non_empty(
				metadata.iter().map(|record| record.category.as_str()),
			),
			statuses: assemble::distinct_non_empty(
				metadata.iter().map(|record| record.status.as_str()),
			),
			lodging_types: assemble::distinct_non_empty(
				metadata.iter().map(|record| record.lodging_type.as_str()),
			),
		})
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let texts = [query.to_string()];
		let embeddings = self
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| Error::Provider { message: err.to_string() })?;
		let vector = embeddings.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}

fn default_filter_status() -> Option<String> {
	Some("Active".to_string())
}

fn default_page() -> u32 {
	1
}

fn default_per_page() -> u32 {
	10
}

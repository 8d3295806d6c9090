use std::collections::BTreeSet;

use affinity_storage::ScoredHit;

use crate::search::{Highlight, PagedResult, SearchFacets, SearchResult};

const RESULT_MESSAGE: &str = "These affinities are relevant to your search.";

/// Turns raw ranked hits into the paginated, faceted, explained response.
///
/// Hits arrive already ranked by the store (ascending distance). The
/// min_score cutoff keeps hits whose rounded distance is at most the
/// cutoff; despite the name it is a maximum-distance bound, and the
/// comparison stays on distance, never inverted into a similarity score.
pub(crate) fn assemble(
	query: &str,
	context: Option<&str>,
	hits: Vec<ScoredHit>,
	min_score: Option<f64>,
	page: u32,
	per_page: u32,
) -> PagedResult {
	let query_lower = query.to_lowercase();
	let context_lower = context.filter(|value| !value.is_empty()).map(str::to_lowercase);

	let mut output: Vec<SearchResult> = hits
		.into_iter()
		.map(|hit| explain_hit(hit, query_lower.as_str(), context, context_lower.as_deref()))
		.collect();

	if let Some(cutoff) = min_score {
		output.retain(|result| result.similarity_score <= cutoff);
	}

	// Facets and the total describe the whole filtered set, not the page.
	let total = output.len();
	let facets = SearchFacets {
		categories: distinct_non_empty(output.iter().map(|result| result.category.as_str())),
		platform_scores: distinct_non_empty(
			output.iter().flat_map(|result| result.platform_scores.iter().map(String::as_str)),
		),
	};

	let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
	let results: Vec<SearchResult> =
		output.into_iter().skip(start).take(per_page as usize).collect();

	PagedResult {
		message: RESULT_MESSAGE.to_string(),
		results,
		total,
		page,
		per_page,
		facets,
	}
}

fn explain_hit(
	hit: ScoredHit,
	query_lower: &str,
	context: Option<&str>,
	context_lower: Option<&str>,
) -> SearchResult {
	let ScoredHit { metadata, distance, document } = hit;
	let mut match_reason = Vec::new();
	let mut highlight = Highlight::default();

	if metadata.input_concept.to_lowercase().contains(query_lower) {
		match_reason.push("input_concept".to_string());
		highlight.input_concept = Some(metadata.input_concept.clone());
	}
	if metadata.category.to_lowercase().contains(query_lower) {
		match_reason.push("category".to_string());
		highlight.category = Some(metadata.category.clone());
	}

	let matched_tags: Vec<String> = metadata
		.related_tags
		.iter()
		.filter(|tag| tag.to_lowercase().contains(query_lower))
		.cloned()
		.collect();

	if !matched_tags.is_empty() {
		match_reason.push("related_tag".to_string());
		highlight.related_tags = matched_tags;
	}
	if let Some(context_lower) = context_lower
		&& document.to_lowercase().contains(context_lower)
	{
		match_reason.push("context".to_string());
		highlight.context = context.map(str::to_string);
	}

	SearchResult {
		input_concept: metadata.input_concept,
		category: metadata.category,
		definition: metadata.definition,
		similarity_score: round4(distance),
		platform_scores: metadata.platform_scores,
		match_reason,
		highlight,
	}
}

pub(crate) fn distinct_non_empty<'a, I>(values: I) -> Vec<String>
where
	I: IntoIterator<Item = &'a str>,
{
	values
		.into_iter()
		.filter(|value| !value.is_empty())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.map(str::to_string)
		.collect()
}

fn round4(distance: f32) -> f64 {
	(f64::from(distance) * 10_000.0).round() / 10_000.0
}

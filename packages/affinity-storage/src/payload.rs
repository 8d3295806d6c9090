//! The single point of contact between in-process metadata collections and
//! the store's flat string payloads. Tag and score lists travel as
//! `"; "`-joined strings on the wire; everything above this module works
//! with true collections.

use std::collections::HashMap;

use qdrant_client::qdrant::{Condition, Filter, Value, value::Kind};

use affinity_domain::{MetadataFilter, MetadataRecord};

pub const LIST_SEPARATOR: &str = "; ";
pub const DOCUMENT_KEY: &str = "document";

pub fn join_list(items: &[String]) -> String {
	items.join(LIST_SEPARATOR)
}

/// Inverse of `join_list`; an empty string decodes to an empty list, not
/// a single empty element.
pub fn split_list(raw: &str) -> Vec<String> {
	if raw.is_empty() {
		return Vec::new();
	}

	raw.split(LIST_SEPARATOR).map(str::to_string).collect()
}

pub fn encode(metadata: &MetadataRecord, document: &str) -> HashMap<String, Value> {
	let mut payload = HashMap::new();
	payload.insert("input_concept".to_string(), Value::from(metadata.input_concept.clone()));
	payload.insert("category".to_string(), Value::from(metadata.category.clone()));
	payload.insert("definition".to_string(), Value::from(metadata.definition.clone()));
	payload.insert("lodging_type".to_string(), Value::from(metadata.lodging_type.clone()));
	payload.insert("related_tags".to_string(), Value::from(join_list(&metadata.related_tags)));
	payload
		.insert("platform_scores".to_string(), Value::from(join_list(&metadata.platform_scores)));
	payload.insert("status".to_string(), Value::from(metadata.status.clone()));
	payload.insert("date_created".to_string(), Value::from(metadata.date_created.clone()));
	payload.insert("last_updated".to_string(), Value::from(metadata.last_updated.clone()));
	payload.insert("source".to_string(), Value::from(metadata.source.clone()));
	payload.insert(DOCUMENT_KEY.to_string(), Value::from(document.to_string()));

	payload
}

/// Rebuilds the metadata record from a stored payload. Unknown payload
/// fields are ignored; missing fields decode to empty values.
pub fn decode(payload: &HashMap<String, Value>) -> MetadataRecord {
	MetadataRecord {
		input_concept: string_field(payload, "input_concept"),
		category: string_field(payload, "category"),
		definition: string_field(payload, "definition"),
		lodging_type: string_field(payload, "lodging_type"),
		related_tags: split_list(&string_field(payload, "related_tags")),
		platform_scores: split_list(&string_field(payload, "platform_scores")),
		status: string_field(payload, "status"),
		date_created: string_field(payload, "date_created"),
		last_updated: string_field(payload, "last_updated"),
		source: string_field(payload, "source"),
	}
}

pub fn document(payload: &HashMap<String, Value>) -> String {
	string_field(payload, DOCUMENT_KEY)
}

/// Translates the planner's clause list into the backend filter. Zero
/// clauses attach no filter at all; one or more become a must-conjunction
/// of equality matches.
pub fn qdrant_filter(filter: &MetadataFilter) -> Option<Filter> {
	if filter.is_empty() {
		return None;
	}

	Some(Filter::must(
		filter
			.clauses()
			.iter()
			.map(|(field, value)| Condition::matches(field.payload_key(), value.clone())),
	))
}

fn string_field(payload: &HashMap<String, Value>, key: &str) -> String {
	match payload.get(key).and_then(|value| value.kind.as_ref()) {
		Some(Kind::StringValue(text)) => text.clone(),
		_ => String::new(),
	}
}

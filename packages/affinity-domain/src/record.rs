use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;

/// One raw affinity concept as it arrives from the definitions file.
///
/// The wire format is semi-structured; every field is optional there, so
/// each field carries a serde default and the validator decides which
/// absences are fatal for a record.
#[derive(Clone, Debug, Deserialize)]
pub struct AffinityRecord {
	#[serde(default)]
	pub input_concept: String,
	#[serde(default)]
	pub normalized_concept: String,
	#[serde(default)]
	pub travel_category: Option<TravelCategory>,
	#[serde(default)]
	pub top_defining_attributes: Vec<DefiningAttribute>,
	#[serde(default)]
	pub themes: Vec<Theme>,
	#[serde(default)]
	pub additional_relevant_subscores: Vec<String>,
	#[serde(default = "default_lodging_types")]
	pub applicable_lodging_types: String,
	#[serde(default = "default_status")]
	pub status: String,
	#[serde(default)]
	pub date_created: String,
	#[serde(default)]
	pub last_updated: String,
	#[serde(default)]
	pub source: String,
}

impl Default for AffinityRecord {
	fn default() -> Self {
		Self {
			input_concept: String::new(),
			normalized_concept: String::new(),
			travel_category: None,
			top_defining_attributes: Vec::new(),
			themes: Vec::new(),
			additional_relevant_subscores: Vec::new(),
			applicable_lodging_types: default_lodging_types(),
			status: default_status(),
			date_created: String::new(),
			last_updated: String::new(),
			source: String::new(),
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TravelCategory {
	#[serde(default, rename = "prefLabel")]
	pub pref_label: String,
	#[serde(default, rename = "skos:definition")]
	pub definition: String,
}
impl TravelCategory {
	/// An empty object on the wire counts as absent.
	pub fn is_blank(&self) -> bool {
		self.pref_label.is_empty() && self.definition.is_empty()
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DefiningAttribute {
	#[serde(default, rename = "skos:prefLabel")]
	pub pref_label: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Theme {
	#[serde(default, rename = "subScore")]
	pub sub_score: String,
}

/// Controlled-vocabulary file listing the subscores the platform surfaces.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Vocabulary {
	#[serde(default)]
	pub master_subscore_list: Vec<String>,
}

/// Normalized master subscore set. Subscores outside the set never reach
/// `platform_scores`; exclusion is silent, not an error.
#[derive(Clone, Debug, Default)]
pub struct SubscoreSet(HashSet<String>);
impl SubscoreSet {
	pub fn from_labels<I>(labels: I) -> Self
	where
		I: IntoIterator<Item = String>,
	{
		Self(labels.into_iter().map(|label| normalize_tag(&label)).collect())
	}

	pub fn contains(&self, normalized: &str) -> bool {
		self.0.contains(normalized)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<Vocabulary> for SubscoreSet {
	fn from(vocabulary: Vocabulary) -> Self {
		Self::from_labels(vocabulary.master_subscore_list)
	}
}

/// The exact metadata stored per indexed concept. Tag and score lists are
/// true collections here; the flat `"; "`-joined encoding exists only at
/// the store boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataRecord {
	pub input_concept: String,
	pub category: String,
	pub definition: String,
	pub lodging_type: String,
	pub related_tags: Vec<String>,
	pub platform_scores: Vec<String>,
	pub status: String,
	pub date_created: String,
	pub last_updated: String,
	pub source: String,
}

/// Concatenates the text fields fed to the embedding model, in fixed
/// order, skipping empty parts.
pub fn extract_text(record: &AffinityRecord) -> String {
	let mut parts: Vec<&str> =
		vec![record.input_concept.as_str(), record.normalized_concept.as_str()];

	if let Some(category) = &record.travel_category {
		parts.push(category.pref_label.as_str());
		parts.push(category.definition.as_str());
	}

	parts.extend(record.top_defining_attributes.iter().map(|attribute| attribute.pref_label.as_str()));

	parts.into_iter().filter(|part| !part.is_empty()).collect::<Vec<_>>().join(". ")
}

/// Normalizes a tag or subscore for consistency: trim, lowercase, internal
/// spaces to underscores. Total and idempotent.
pub fn normalize_tag(tag: &str) -> String {
	tag.trim().to_lowercase().replace(' ', "_")
}

/// Derives the full metadata record for one concept. Always re-derives
/// every field from the source record; stored metadata is never patched
/// field-by-field.
pub fn derive_metadata(record: &AffinityRecord, subscores: &SubscoreSet) -> MetadataRecord {
	let related_tags: Vec<String> = record
		.top_defining_attributes
		.iter()
		.map(|attribute| normalize_tag(&attribute.pref_label))
		.filter(|tag| !tag.is_empty())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect();

	let mut platform_scores = BTreeSet::new();
	for theme in &record.themes {
		let normalized = normalize_tag(&theme.sub_score);
		if !normalized.is_empty() && subscores.contains(&normalized) {
			platform_scores.insert(normalized);
		}
	}
	for subscore in &record.additional_relevant_subscores {
		let normalized = normalize_tag(subscore);
		if !normalized.is_empty() && subscores.contains(&normalized) {
			platform_scores.insert(normalized);
		}
	}

	let (category, definition) = match &record.travel_category {
		Some(category) => (category.pref_label.clone(), category.definition.clone()),
		None => (String::new(), String::new()),
	};

	MetadataRecord {
		input_concept: record.input_concept.clone(),
		category,
		definition,
		lodging_type: record.applicable_lodging_types.clone(),
		related_tags,
		platform_scores: platform_scores.into_iter().collect(),
		status: record.status.clone(),
		date_created: record.date_created.clone(),
		last_updated: record.last_updated.clone(),
		source: record.source.clone(),
	}
}

fn default_lodging_types() -> String {
	"Both".to_string()
}

fn default_status() -> String {
	"Active".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attribute(label: &str) -> DefiningAttribute {
		DefiningAttribute { pref_label: label.to_string() }
	}

	#[test]
	fn normalize_tag_is_idempotent() {
		for raw in ["  Luxury Score ", "POOL view", "spa", "a  b", ""] {
			let once = normalize_tag(raw);
			assert_eq!(normalize_tag(&once), once);
		}
	}

	#[test]
	fn extract_text_skips_empty_parts_in_fixed_order() {
		let record = AffinityRecord {
			input_concept: "Ocean View Room".to_string(),
			travel_category: Some(TravelCategory {
				pref_label: "Room Type".to_string(),
				definition: String::new(),
			}),
			top_defining_attributes: vec![attribute("Balcony"), attribute("")],
			..Default::default()
		};

		assert_eq!(extract_text(&record), "Ocean View Room. Room Type. Balcony");
	}

	#[test]
	fn related_tags_are_sorted_deduped_and_normalized() {
		let record = AffinityRecord {
			input_concept: "Spa Resort".to_string(),
			top_defining_attributes: vec![attribute("Spa"), attribute("spa"), attribute("Pool View")],
			..Default::default()
		};
		let metadata = derive_metadata(&record, &SubscoreSet::default());

		assert_eq!(metadata.related_tags, vec!["pool_view".to_string(), "spa".to_string()]);
	}

	#[test]
	fn platform_scores_pass_the_vocabulary_gate() {
		let subscores = SubscoreSet::from_labels(vec!["luxury_score".to_string()]);
		let record = AffinityRecord {
			input_concept: "Luxury Villa".to_string(),
			additional_relevant_subscores: vec![
				"Luxury Score".to_string(),
				"Hidden Score".to_string(),
			],
			..Default::default()
		};
		let metadata = derive_metadata(&record, &subscores);

		assert_eq!(metadata.platform_scores, vec!["luxury_score".to_string()]);
	}

	#[test]
	fn platform_scores_merge_themes_and_additional_subscores() {
		let subscores =
			SubscoreSet::from_labels(vec!["luxury_score".to_string(), "family_score".to_string()]);
		let record = AffinityRecord {
			input_concept: "Family Resort".to_string(),
			themes: vec![Theme { sub_score: "Family Score".to_string() }],
			additional_relevant_subscores: vec!["luxury score".to_string()],
			..Default::default()
		};
		let metadata = derive_metadata(&record, &subscores);

		assert_eq!(
			metadata.platform_scores,
			vec!["family_score".to_string(), "luxury_score".to_string()]
		);
	}

	#[test]
	fn lodging_type_and_status_default_when_absent_on_the_wire() {
		let record: AffinityRecord = serde_json::from_value(serde_json::json!({
			"input_concept": "Ocean View Room",
			"travel_category": { "prefLabel": "Room Type" }
		}))
		.expect("record parses");
		let metadata = derive_metadata(&record, &SubscoreSet::default());

		assert_eq!(metadata.lodging_type, "Both");
		assert_eq!(metadata.status, "Active");
	}

	#[test]
	fn explicit_empty_strings_are_preserved_over_defaults() {
		let record: AffinityRecord = serde_json::from_value(serde_json::json!({
			"input_concept": "Ocean View Room",
			"travel_category": { "prefLabel": "Room Type" },
			"applicable_lodging_types": "",
			"status": ""
		}))
		.expect("record parses");
		let metadata = derive_metadata(&record, &SubscoreSet::default());

		assert_eq!(metadata.lodging_type, "");
		assert_eq!(metadata.status, "");
	}

	#[test]
	fn vocabulary_file_converts_to_a_normalized_set() {
		let vocabulary: Vocabulary = serde_json::from_value(serde_json::json!({
			"master_subscore_list": ["Luxury Score", "  Family Score  "]
		}))
		.expect("vocabulary parses");
		let subscores = SubscoreSet::from(vocabulary);

		assert_eq!(subscores.len(), 2);
		assert!(subscores.contains("luxury_score"));
		assert!(subscores.contains("family_score"));
	}
}

use std::collections::HashSet;

use crate::record::AffinityRecord;

/// Why a record was dropped during ingestion. Record-level problems never
/// abort a run; they are logged and summarized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordReject {
	MissingInputConcept,
	MissingTravelCategory,
	DuplicateConcept,
}
impl RecordReject {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MissingInputConcept => "missing_input_concept",
			Self::MissingTravelCategory => "missing_travel_category",
			Self::DuplicateConcept => "duplicate_concept",
		}
	}
}

/// Checks the required fields of a single record. `travel_category` counts
/// as missing when absent or when the object carried no values at all.
pub fn validate(record: &AffinityRecord) -> Result<(), RecordReject> {
	if record.input_concept.is_empty() {
		return Err(RecordReject::MissingInputConcept);
	}
	if record.travel_category.as_ref().map(|category| category.is_blank()).unwrap_or(true) {
		return Err(RecordReject::MissingTravelCategory);
	}

	Ok(())
}

/// Filters a raw batch down to the valid, unique record set.
///
/// Order-preserving: accepted records keep their input relative order, and
/// for duplicate `input_concept` values the first occurrence wins. Later
/// duplicates are dropped, never merged.
pub fn clean(records: Vec<AffinityRecord>) -> Vec<AffinityRecord> {
	let mut seen = HashSet::new();
	let mut accepted = Vec::with_capacity(records.len());

	for record in records {
		if let Err(reject) = validate(&record) {
			tracing::warn!(
				concept = %record.input_concept,
				reason = reject.as_str(),
				"Dropping invalid affinity record."
			);

			continue;
		}
		if !seen.insert(record.input_concept.clone()) {
			tracing::warn!(
				concept = %record.input_concept,
				reason = RecordReject::DuplicateConcept.as_str(),
				"Duplicate input_concept found and skipped."
			);

			continue;
		}

		accepted.push(record);
	}

	accepted
}

use crate::record::MetadataRecord;

/// Metadata fields a search may restrict on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
	Status,
	LodgingType,
	Category,
}
impl FilterField {
	pub fn payload_key(self) -> &'static str {
		match self {
			Self::Status => "status",
			Self::LodgingType => "lodging_type",
			Self::Category => "category",
		}
	}
}

/// A conjunction of equality clauses over the metadata schema. Empty means
/// unrestricted. The store boundary translates this into the backend's
/// filter syntax; `matches` evaluates the same conjunction in-process.
#[derive(Clone, Debug, Default)]
pub struct MetadataFilter {
	clauses: Vec<(FilterField, String)>,
}
impl MetadataFilter {
	pub fn new(
		status: Option<&str>,
		lodging_type: Option<&str>,
		category: Option<&str>,
	) -> Self {
		let mut clauses = Vec::new();

		if let Some(status) = status.filter(|value| !value.is_empty()) {
			clauses.push((FilterField::Status, status.to_string()));
		}
		if let Some(lodging_type) = lodging_type.filter(|value| !value.is_empty()) {
			clauses.push((FilterField::LodgingType, lodging_type.to_string()));
		}
		if let Some(category) = category.filter(|value| !value.is_empty()) {
			clauses.push((FilterField::Category, category.to_string()));
		}

		Self { clauses }
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn clauses(&self) -> &[(FilterField, String)] {
		&self.clauses
	}

	pub fn matches(&self, metadata: &MetadataRecord) -> bool {
		self.clauses.iter().all(|(field, value)| {
			let actual = match field {
				FilterField::Status => metadata.status.as_str(),
				FilterField::LodgingType => metadata.lodging_type.as_str(),
				FilterField::Category => metadata.category.as_str(),
			};

			actual == value
		})
	}
}

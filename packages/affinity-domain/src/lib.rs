pub mod filter;
pub mod ingest;
pub mod record;

pub use filter::{FilterField, MetadataFilter};
pub use ingest::{RecordReject, clean, validate};
pub use record::{
	AffinityRecord, DefiningAttribute, MetadataRecord, SubscoreSet, Theme, TravelCategory,
	Vocabulary, derive_metadata, extract_text, normalize_tag,
};

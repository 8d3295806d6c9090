use std::sync::Arc;

use affinity_service::AffinityService;
use affinity_storage::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AffinityService>,
}
impl AppState {
	/// Opens the store connection once; every request shares the handle.
	pub fn new(config: affinity_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = AffinityService::new(config, qdrant);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: AffinityService) -> Self {
		Self { service: Arc::new(service) }
	}
}

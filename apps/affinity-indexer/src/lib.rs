use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use affinity_domain::{AffinityRecord, SubscoreSet, Vocabulary, clean};
use affinity_service::AffinityService;
use affinity_storage::QdrantStore;

/// Builds the affinity vector index from a definitions file.
///
/// Missing or unreadable input files abort the run with a non-zero exit;
/// batch-level embedding or store failures are logged, summarized, and
/// never fail the process.
#[derive(Debug, Parser)]
#[command(
	version = affinity_cli::VERSION,
	rename_all = "kebab",
	styles = affinity_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Affinity definitions JSON.
	#[arg(long, value_name = "FILE")]
	pub input: PathBuf,
	/// Controlled-vocabulary JSON with the master subscore list.
	#[arg(long, value_name = "FILE")]
	pub vocabulary: PathBuf,
	/// Overrides the collection name from the config file.
	#[arg(long, value_name = "NAME")]
	pub collection: Option<String>,
	/// Overrides the embedding model from the config file.
	#[arg(long, value_name = "MODEL")]
	pub model: Option<String>,
	/// Overrides the batch size from the config file.
	#[arg(long, value_name = "N")]
	pub batch_size: Option<usize>,
	/// Reuse an existing collection instead of clearing it first.
	#[arg(long)]
	pub no_clear: bool,
}

pub async fn run(args: Args) -> Result<()> {
	let mut config = affinity_config::load(&args.config)?;
	init_tracing(&config);

	if let Some(collection) = args.collection {
		config.storage.qdrant.collection = collection;
	}
	if let Some(model) = args.model {
		config.providers.embedding.model = model;
	}
	if let Some(batch_size) = args.batch_size {
		config.index.batch_size = batch_size;
	}

	tracing::info!("Loading records and vocabulary...");

	let records: Vec<AffinityRecord> = read_json(&args.input)?;
	let vocabulary: Vocabulary = read_json(&args.vocabulary)?;
	let subscores = SubscoreSet::from(vocabulary);
	let records = clean(records);

	tracing::info!(count = records.len(), "Loaded unique, valid affinity records.");

	let store = QdrantStore::new(&config.storage.qdrant)?;
	let clear_first = !args.no_clear;
	let service = AffinityService::new(config, store);
	let summary = service.build_index(&records, &subscores, clear_first).await?;

	tracing::info!(
		total = summary.total,
		indexed = summary.indexed,
		"Affinity index build complete."
	);

	Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
	let raw = fs::read_to_string(path)
		.wrap_err_with(|| format!("Failed to read {}.", path.display()))?;

	serde_json::from_str(&raw).wrap_err_with(|| format!("Failed to parse {}.", path.display()))
}

fn init_tracing(config: &affinity_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn args_parse_with_overrides() {
		let args = Args::try_parse_from([
			"affinity-indexer",
			"--config",
			"affinity.toml",
			"--input",
			"data/affinity_definitions.json",
			"--vocabulary",
			"config/affinity_config.json",
			"--collection",
			"affinities_v2",
			"--batch-size",
			"64",
			"--no-clear",
		])
		.expect("args parse");

		assert_eq!(args.collection.as_deref(), Some("affinities_v2"));
		assert_eq!(args.batch_size, Some(64));
		assert!(args.no_clear);
	}

	#[test]
	fn clear_is_the_default() {
		let args = Args::try_parse_from([
			"affinity-indexer",
			"--config",
			"affinity.toml",
			"--input",
			"data.json",
			"--vocabulary",
			"vocab.json",
		])
		.expect("args parse");

		assert!(!args.no_clear);
		assert!(args.collection.is_none());
		assert!(args.batch_size.is_none());
	}
}

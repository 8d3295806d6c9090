use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = affinity_indexer::Args::parse();
	affinity_indexer::run(args).await
}

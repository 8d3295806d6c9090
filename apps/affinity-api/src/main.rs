use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = affinity_api::Args::parse();
	affinity_api::run(args).await
}

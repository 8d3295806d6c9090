pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use axum::http::HeaderValue;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = affinity_cli::VERSION,
	rename_all = "kebab",
	styles = affinity_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = affinity_config::load(&args.config)?;
	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let cors_allow_origin = config.service.cors_allow_origin.clone();
	let state = AppState::new(config)?;
	let mut app = routes::router(state);

	if let Some(origin) = cors_allow_origin {
		let cors = CorsLayer::new()
			.allow_origin(origin.parse::<HeaderValue>()?)
			.allow_methods(Any)
			.allow_headers(Any);
		app = app.layer(cors);
	}

	let listener = TcpListener::bind(http_addr).await?;
	tracing::info!(%http_addr, "HTTP server listening.");
	axum::serve(listener, app).await?;

	Ok(())
}

fn init_tracing(config: &affinity_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

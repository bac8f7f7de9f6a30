pub mod delivery;
pub mod poller;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
	delivery::{DeliveryWorker, FinalizationHandler},
	poller::Poller,
};

#[derive(Debug, Parser)]
#[command(
	version = notedrop_cli::VERSION,
	rename_all = "kebab",
	styles = notedrop_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = notedrop_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = notedrop_storage::db::Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let delivery = config.delivery;
	let poller = Poller::new(db.clone(), delivery.clone());
	let finalizer = FinalizationHandler::new(db.clone());
	let mut tasks = tokio::task::JoinSet::new();

	tasks.spawn(async move { poller.run().await });

	for _ in 0..delivery.concurrency {
		let worker = DeliveryWorker::new(db.clone(), delivery.clone(), finalizer.clone())?;

		tasks.spawn(async move { worker.run().await });
	}

	tracing::info!(
		concurrency = delivery.concurrency,
		poll_interval_secs = delivery.poll_interval_secs,
		"Delivery pipeline started."
	);

	// The loops only return on a fatal error; surface the first one.
	while let Some(joined) = tasks.join_next().await {
		joined??;
	}

	Ok(())
}

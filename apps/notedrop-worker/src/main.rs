use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = notedrop_worker::Args::parse();
	notedrop_worker::run(args).await
}

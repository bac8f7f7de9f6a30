use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = notedrop_api::Args::parse();
	notedrop_api::run(args).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = notedrop_sink::Args::parse();
	notedrop_sink::run(args).await
}

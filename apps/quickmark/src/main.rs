use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = quickmark::Args::parse();
	quickmark::run(args).await
}

pub mod cli;
pub mod render;

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tokio::{
	io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader},
	time,
};
use tracing_subscriber::EnvFilter;

use qm_config::{Config, Settings};
use qm_search::{ResultStream, SearchSession};

#[derive(Debug, Parser)]
#[command(
	version = cli::VERSION,
	rename_all = "kebab",
	styles = cli::styles(),
)]
pub struct Args {
	/// Settings file. Values missing from it are read from QUICKMARK_* environment variables.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	/// After stdin closes, how long to wait for the last query's results.
	#[arg(long, value_name = "MS", default_value_t = 15_000)]
	pub wait_ms: u64,
}

/// Every stdin line is treated as the complete new query text.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = match args.config.as_deref() {
		Some(path) => qm_config::load(path)?,
		None => Config::default(),
	};
	let settings = config.resolve()?;

	init_tracing(&settings)?;

	let (session, mut stream) = SearchSession::from_settings(&settings)?;

	tracing::info!(
		debounce_ms = settings.search.debounce.as_millis() as u64,
		max_results = settings.search.max_results,
		rerank = settings.search.rerank_enabled,
		"Search session ready."
	);

	let input = BufReader::new(io::stdin());
	let mut out = io::stdout();

	serve(&session, &mut stream, input, &mut out, Duration::from_millis(args.wait_ms)).await?;
	session.shutdown();

	Ok(())
}

/// Feeds `input` lines to the session and renders publications until the input ends, then
/// waits up to `wait` for the last query to finish.
pub async fn serve<R, W>(
	session: &SearchSession,
	stream: &mut ResultStream,
	input: R,
	out: &mut W,
	wait: Duration,
) -> color_eyre::Result<()>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut lines = input.lines();

	render::prompt(out).await?;

	loop {
		tokio::select! {
			line = lines.next_line() => match line? {
				Some(text) => {
					session.on_query_changed(text);
				},
				None => break,
			},
			Some(publication) = stream.next() => render::publication(out, &publication).await?,
		}
	}

	let settled = time::timeout(wait, session.settled()).await;

	while let Some(publication) = stream.try_next() {
		render::publication(out, &publication).await?;
	}

	if settled.is_err() {
		tracing::warn!(
			wait_ms = wait.as_millis() as u64,
			"Stopped waiting for the last query's results."
		);
	}

	Ok(())
}

fn init_tracing(settings: &Settings) -> color_eyre::Result<()> {
	let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use tokio::{io::AsyncWriteExt, time::Instant};
	use tokio_util::sync::CancellationToken;

	use qm_config::SearchTuning;
	use qm_search::{BoxFuture, Fetcher, Item, Providers, View};

	use super::*;

	struct DelayedHit(Duration);
	impl Fetcher for DelayedHit {
		fn fetch<'a>(
			&'a self,
			query: &'a str,
			_cancel: &'a CancellationToken,
		) -> BoxFuture<'a, qm_providers::Result<Vec<Item>>> {
			Box::pin(async move {
				time::sleep(self.0).await;

				Ok(vec![Item { title: format!("hit for {query}"), ..Item::default() }])
			})
		}
	}

	fn start(fetch_delay: Duration) -> (SearchSession, ResultStream) {
		let providers = Providers::new(Arc::new(DelayedHit(fetch_delay)), None);

		SearchSession::new(providers, SearchTuning::new(300, 20, false))
			.expect("Failed to start search session.")
	}

	#[tokio::test(start_paused = true)]
	async fn exits_at_eof_when_newest_result_is_on_screen() {
		let (session, mut stream) = start(Duration::ZERO);
		let (mut writer, reader) = io::duplex(64);
		let typist = tokio::spawn(async move {
			writer.write_all(b"rust\n").await.expect("Failed to write query.");
			time::sleep(Duration::from_secs(2)).await;
		});
		let started = Instant::now();
		let mut out = Vec::new();

		serve(&session, &mut stream, BufReader::new(reader), &mut out, Duration::from_secs(60))
			.await
			.expect("Serve failed.");
		typist.await.expect("Typist task panicked.");

		let elapsed = started.elapsed();
		let text = String::from_utf8(out).expect("Output must be UTF-8.");

		assert!(
			elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3),
			"Exited after {elapsed:?}."
		);
		assert_eq!(text.matches("[1] 1 result").count(), 1, "Unexpected output: {text}");
	}

	#[tokio::test(start_paused = true)]
	async fn waits_for_result_of_last_line() {
		let (session, mut stream) = start(Duration::from_millis(100));
		let started = Instant::now();
		let mut out = Vec::new();

		serve(&session, &mut stream, &b"ru\nrust\n"[..], &mut out, Duration::from_secs(60))
			.await
			.expect("Serve failed.");

		let elapsed = started.elapsed();
		let text = String::from_utf8(out).expect("Output must be UTF-8.");

		assert!(elapsed >= Duration::from_millis(400) && elapsed < Duration::from_millis(500));
		assert!(text.contains("[2] 1 result\n    1. hit for rust"), "Unexpected output: {text}");
		assert!(!text.contains("[1]"), "Unexpected output: {text}");
	}

	#[tokio::test(start_paused = true)]
	async fn gives_up_after_wait() {
		let (session, mut stream) = start(Duration::from_secs(600));
		let started = Instant::now();
		let mut out = Vec::new();

		serve(&session, &mut stream, &b"rust\n"[..], &mut out, Duration::from_secs(1))
			.await
			.expect("Serve failed.");

		let text = String::from_utf8(out).expect("Output must be UTF-8.");

		assert_eq!(started.elapsed(), Duration::from_secs(1));
		assert_eq!(text, format!("{}\n", View::PromptForInput.status_line()));
	}

	#[tokio::test(start_paused = true)]
	async fn empty_input_exits_at_once() {
		let (session, mut stream) = start(Duration::ZERO);
		let started = Instant::now();
		let mut out = Vec::new();

		serve(&session, &mut stream, &b""[..], &mut out, Duration::from_secs(60))
			.await
			.expect("Serve failed.");

		assert_eq!(started.elapsed(), Duration::ZERO);
	}
}

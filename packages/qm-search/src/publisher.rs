use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::{Item, executor::ResultBatch, version::VersionCounter};

/// What the results list should show.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
	PromptForInput,
	NoResults,
	Results(Vec<Item>),
	Error { message: String },
}
impl View {
	pub fn from_batch(batch: ResultBatch) -> Self {
		if let Some(error) = batch.error {
			return Self::Error { message: error.to_string() };
		}
		if batch.query.trim().is_empty() {
			return Self::PromptForInput;
		}
		if batch.items.is_empty() {
			return Self::NoResults;
		}

		Self::Results(batch.items)
	}

	/// Rows to render. A failed search renders as a single diagnostic row.
	pub fn rows(&self) -> Vec<Item> {
		match self {
			Self::Results(items) => items.clone(),
			Self::Error { message } => vec![Item::diagnostic(message.clone())],
			Self::PromptForInput | Self::NoResults => Vec::new(),
		}
	}

	pub fn status_line(&self) -> String {
		match self {
			Self::PromptForInput => "Type something to search.".to_string(),
			Self::NoResults => "No results.".to_string(),
			Self::Results(items) if items.len() == 1 => "1 result".to_string(),
			Self::Results(items) => format!("{} results", items.len()),
			Self::Error { message } => format!("error: {message}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
	pub version: u64,
	pub query: String,
	pub view: View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
	Delivered,
	/// Superseded by a newer query, or nobody is listening any more.
	Discarded,
}

/// Version-gated hand-off to the display sink.
pub struct ResultPublisher {
	versions: Arc<VersionCounter>,
	sink: UnboundedSender<Publication>,
}
impl ResultPublisher {
	pub fn channel(versions: Arc<VersionCounter>) -> (Self, ResultStream) {
		let (sink, rx) = mpsc::unbounded_channel();

		(Self { versions, sink }, ResultStream { rx })
	}

	pub fn publish(&self, batch: ResultBatch) -> PublishOutcome {
		let current = self.versions.current();

		if batch.version != current {
			tracing::debug!(version = batch.version, current, "Discarded stale result batch.");

			return PublishOutcome::Discarded;
		}

		let publication =
			Publication { version: batch.version, query: batch.query.clone(), view: View::from_batch(batch) };

		match self.sink.send(publication) {
			Ok(()) => PublishOutcome::Delivered,
			Err(_) => {
				tracing::debug!(version = current, "Result sink closed.");

				PublishOutcome::Discarded
			},
		}
	}
}

/// Consumer end of the publish channel, drained by whichever loop owns the display. Delivers in
/// publish order.
pub struct ResultStream {
	rx: UnboundedReceiver<Publication>,
}
impl ResultStream {
	pub async fn next(&mut self) -> Option<Publication> {
		self.rx.recv().await
	}

	/// Non-blocking poll for UI loops that tick on their own schedule.
	pub fn try_next(&mut self) -> Option<Publication> {
		match self.rx.try_recv() {
			Ok(publication) => Some(publication),
			Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
		}
	}

	/// For a dedicated non-async UI thread. Must not be called from within the runtime.
	pub fn blocking_next(&mut self) -> Option<Publication> {
		self.rx.blocking_recv()
	}
}

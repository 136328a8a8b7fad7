use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, sync::Notify};
use tokio_util::sync::CancellationToken;

use crate::{
	Error, Providers, Result,
	debounce::{Debouncer, Settle},
	executor::SearchExecutor,
	gate::{Admission, SearchGate},
	publisher::{PublishOutcome, ResultPublisher, ResultStream},
	supersede::Supersession,
	version::{Query, VersionCounter},
};
use qm_config::{SearchTuning, Settings};

/// Search state for one results page. Feed it every query-text change; read what to display
/// from the [`ResultStream`] returned at construction.
///
/// Dropping the session cancels whatever search is still in flight.
pub struct SearchSession {
	pipeline: Arc<Pipeline>,
	runtime: Handle,
}

struct Pipeline {
	versions: Arc<VersionCounter>,
	supersession: Supersession,
	debouncer: Debouncer,
	gate: SearchGate,
	gate_timeout: Duration,
	executor: SearchExecutor,
	publisher: ResultPublisher,
	settled: Notify,
}

impl SearchSession {
	/// Spawns search chains on the runtime of the calling context.
	pub fn new(providers: Providers, tuning: SearchTuning) -> Result<(Self, ResultStream)> {
		let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

		Ok(Self::with_runtime(providers, tuning, runtime))
	}

	/// HTTP providers built from resolved settings.
	pub fn from_settings(settings: &Settings) -> Result<(Self, ResultStream)> {
		let providers = Providers::from_settings(settings)?;

		Self::new(providers, settings.search)
	}

	/// For UI threads that live outside the runtime.
	pub fn with_runtime(
		providers: Providers,
		tuning: SearchTuning,
		runtime: Handle,
	) -> (Self, ResultStream) {
		let versions = Arc::new(VersionCounter::new());
		let (publisher, stream) = ResultPublisher::channel(versions.clone());
		let pipeline = Pipeline {
			versions,
			supersession: Supersession::new(),
			debouncer: Debouncer::new(tuning.debounce),
			gate: SearchGate::new(),
			gate_timeout: tuning.gate_timeout(),
			executor: SearchExecutor::new(providers, &tuning),
			publisher,
			settled: Notify::new(),
		};

		(Self { pipeline: Arc::new(pipeline), runtime }, stream)
	}

	/// Records a query-text change and starts its search chain, superseding the previous one.
	/// Never blocks.
	pub fn on_query_changed(&self, text: impl Into<String>) -> u64 {
		let pipeline = &self.pipeline;
		let version = pipeline.versions.bump();
		let cancel = pipeline.supersession.start_new(version);
		let query = Query::new(text, version);

		tracing::debug!(version, query_len = query.text.len(), "Query changed.");

		let pipeline = Arc::clone(pipeline);

		self.runtime.spawn(async move { pipeline.run(query, cancel).await });

		version
	}

	pub fn current_version(&self) -> u64 {
		self.pipeline.versions.current()
	}

	/// Version of the search currently executing, if any.
	pub fn active_version(&self) -> Option<u64> {
		self.pipeline.gate.active_version()
	}

	/// Resolves once no search chain is live. Whatever the newest chain published is already
	/// queued on the [`ResultStream`] by then; a chain may also end without publishing.
	pub async fn settled(&self) {
		let pipeline = &self.pipeline;

		loop {
			let notified = pipeline.settled.notified();

			tokio::pin!(notified);
			notified.as_mut().enable();

			if !pipeline.supersession.has_live_chain() {
				return;
			}

			notified.await;
		}
	}

	pub fn shutdown(&self) {
		self.pipeline.supersession.cancel_all();
		self.pipeline.settled.notify_waiters();
	}
}
impl Drop for SearchSession {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl Pipeline {
	async fn run(&self, query: Query, cancel: CancellationToken) {
		let version = query.version;

		self.drive(query, &cancel).await;
		self.supersession.finish(version);
		self.settled.notify_waiters();
	}

	async fn drive(&self, query: Query, cancel: &CancellationToken) {
		let version = query.version;

		match self.debouncer.settle(&query, &self.versions, cancel).await {
			Settle::Ready => {},
			Settle::Canceled => {
				tracing::debug!(version, "Query superseded during debounce.");

				return;
			},
			Settle::Stale => {
				tracing::debug!(version, "Query went stale during debounce.");

				return;
			},
		}

		let permit =
			match self.gate.admit(version, self.gate_timeout, &self.versions, cancel).await {
				Admission::Admitted(permit) => permit,
				Admission::TimedOut => {
					tracing::warn!(
						version,
						timeout_ms = self.gate_timeout.as_millis() as u64,
						"Previous search did not finish in time; dropping query."
					);

					return;
				},
				Admission::Stale | Admission::Canceled => {
					tracing::debug!(version, "Query superseded before admission.");

					return;
				},
			};

		tracing::debug!(version = permit.version(), "Search admitted.");

		let Some(batch) = self.executor.run(&query, cancel).await else {
			tracing::debug!(version, "Search canceled.");

			return;
		};

		// Published while the permit is held, so publications never interleave.
		if self.publisher.publish(batch) == PublishOutcome::Discarded {
			tracing::debug!(version, "Search result superseded.");
		}

		drop(permit);
	}
}

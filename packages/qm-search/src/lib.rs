//! Incremental search pipeline: every query-text change gets a version, waits out a debounce
//! interval, competes for a single-flight gate, runs the fetch (and optional rerank), and is
//! published only if no newer query has arrived in the meantime.

pub mod debounce;
pub mod executor;
pub mod gate;
pub mod publisher;
pub mod session;
pub mod supersede;
pub mod version;

mod error;

pub use debounce::{Debouncer, Settle};
pub use error::{Error, Result};
pub use executor::{ResultBatch, SearchExecutor};
pub use gate::{Admission, GatePermit, SearchGate};
pub use publisher::{Publication, PublishOutcome, ResultPublisher, ResultStream, View};
pub use qm_providers::{Item, RerankHit};
pub use session::SearchSession;
pub use supersede::Supersession;
pub use version::{Query, VersionCounter};

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use qm_config::Settings;
use qm_providers::{bookmarks::BookmarkClient, rerank::RerankClient};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of raw search results. Implementations should stop work promptly once `cancel`
/// fires and may report that as [`qm_providers::Error::Canceled`].
pub trait Fetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		query: &'a str,
		cancel: &'a CancellationToken,
	) -> BoxFuture<'a, qm_providers::Result<Vec<Item>>>;
}

/// Secondary relevance pass over already fetched items.
pub trait Reranker
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		query: &'a str,
		docs: &'a [String],
		cancel: &'a CancellationToken,
	) -> BoxFuture<'a, qm_providers::Result<Vec<RerankHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub fetcher: Arc<dyn Fetcher>,
	pub reranker: Option<Arc<dyn Reranker>>,
}
impl Providers {
	pub fn new(fetcher: Arc<dyn Fetcher>, reranker: Option<Arc<dyn Reranker>>) -> Self {
		Self { fetcher, reranker }
	}

	/// HTTP providers sharing one connection pool.
	pub fn from_settings(settings: &Settings) -> Result<Self> {
		let client = qm_providers::http_client()?;
		let fetcher = Arc::new(BookmarkClient::new(client.clone(), settings.bookmarks.clone()));
		let reranker = settings.rerank.clone().map(|cfg| {
			Arc::new(RerankClient::new(client.clone(), cfg)) as Arc<dyn Reranker>
		});

		Ok(Self { fetcher, reranker })
	}
}

impl Fetcher for BookmarkClient {
	fn fetch<'a>(
		&'a self,
		query: &'a str,
		cancel: &'a CancellationToken,
	) -> BoxFuture<'a, qm_providers::Result<Vec<Item>>> {
		Box::pin(async move {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => Err(qm_providers::Error::Canceled),
				res = self.search(query) => res,
			}
		})
	}
}

impl Reranker for RerankClient {
	fn rerank<'a>(
		&'a self,
		query: &'a str,
		docs: &'a [String],
		cancel: &'a CancellationToken,
	) -> BoxFuture<'a, qm_providers::Result<Vec<RerankHit>>> {
		Box::pin(async move {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => Err(qm_providers::Error::Canceled),
				res = RerankClient::rerank(self, query, docs) => res,
			}
		})
	}
}

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Item, Providers, RerankHit, Reranker, version::Query};
use qm_config::SearchTuning;

/// Outcome of one executed search.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBatch {
	pub version: u64,
	pub query: String,
	pub items: Vec<Item>,
	pub error: Option<qm_providers::Error>,
}
impl ResultBatch {
	fn ok(query: &Query, items: Vec<Item>) -> Self {
		Self { version: query.version, query: query.text.clone(), items, error: None }
	}

	fn failed(query: &Query, error: qm_providers::Error) -> Self {
		Self { version: query.version, query: query.text.clone(), items: Vec::new(), error: Some(error) }
	}
}

/// Runs fetch, the optional rerank pass and truncation for one admitted query.
pub struct SearchExecutor {
	providers: Providers,
	max_results: usize,
	rerank_enabled: bool,
}
impl SearchExecutor {
	pub fn new(providers: Providers, tuning: &SearchTuning) -> Self {
		Self { providers, max_results: tuning.max_results, rerank_enabled: tuning.rerank_enabled }
	}

	/// Returns `None` when the search was canceled; such a search produces no batch at all.
	pub async fn run(&self, query: &Query, cancel: &CancellationToken) -> Option<ResultBatch> {
		if query.is_empty() {
			return Some(ResultBatch::ok(query, Vec::new()));
		}

		let started = Instant::now();
		let fetched = tokio::select! {
			biased;
			_ = cancel.cancelled() => return None,
			res = self.providers.fetcher.fetch(&query.text, cancel) => res,
		};
		let items = match fetched {
			Ok(items) => items,
			Err(qm_providers::Error::Canceled) => return None,
			Err(err) => {
				tracing::error!(version = query.version, error = %err, "Bookmark search failed.");

				return Some(ResultBatch::failed(query, err));
			},
		};
		let fetched_count = items.len();
		let mut items = match self.reranker() {
			Some(reranker) if !items.is_empty() =>
				rerank_items(reranker.as_ref(), query, items, cancel).await?,
			_ => items,
		};

		items.truncate(self.max_results);

		tracing::info!(
			version = query.version,
			fetched = fetched_count,
			returned = items.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Search completed."
		);

		Some(ResultBatch::ok(query, items))
	}

	fn reranker(&self) -> Option<&Arc<dyn Reranker>> {
		if self.rerank_enabled { self.providers.reranker.as_ref() } else { None }
	}
}

/// Reorders `items` by reranker relevance. Any rerank failure keeps the fetch order; only
/// cancellation yields `None`.
async fn rerank_items(
	reranker: &dyn Reranker,
	query: &Query,
	items: Vec<Item>,
	cancel: &CancellationToken,
) -> Option<Vec<Item>> {
	let docs: Vec<String> = items.iter().map(Item::rerank_document).collect();
	let reranked = tokio::select! {
		biased;
		_ = cancel.cancelled() => return None,
		res = reranker.rerank(&query.text, &docs, cancel) => res,
	};
	let hits = match reranked {
		Ok(hits) => hits,
		Err(qm_providers::Error::Canceled) => return None,
		Err(err) if err.is_transient() => {
			tracing::warn!(
				version = query.version,
				error = %err,
				"Rerank failed; keeping fetch order."
			);

			return Some(items);
		},
		Err(err) => {
			tracing::error!(
				version = query.version,
				error = %err,
				"Rerank failed; keeping fetch order."
			);

			return Some(items);
		},
	};
	let Some(order) = rerank_order(items.len(), &hits) else {
		tracing::warn!(
			version = query.version,
			hits = hits.len(),
			"Rerank response had no usable index; keeping fetch order."
		);

		return Some(items);
	};

	Some(apply_order(items, &order))
}

/// Full permutation of `0..len`: valid hits by descending score, then unmentioned positions in
/// their original order. Out-of-range and repeated indices are dropped. `None` when no hit is
/// usable.
fn rerank_order(len: usize, hits: &[RerankHit]) -> Option<Vec<usize>> {
	let mut seen = vec![false; len];
	let mut ranked = Vec::with_capacity(hits.len().min(len));

	for hit in hits {
		if hit.index < len && !seen[hit.index] {
			seen[hit.index] = true;

			ranked.push(*hit);
		}
	}

	if ranked.is_empty() {
		return None;
	}
	if ranked.len() < hits.len() {
		tracing::debug!(
			discarded = hits.len() - ranked.len(),
			"Discarded out-of-range or repeated rerank indices."
		);
	}

	// Stable, so equal scores keep provider order. NaN sorts last.
	ranked.sort_by(|a, b| score_key(b.score).total_cmp(&score_key(a.score)));

	let mut order: Vec<usize> = ranked.iter().map(|hit| hit.index).collect();

	order.extend((0..len).filter(|index| !seen[*index]));

	Some(order)
}

fn score_key(score: f32) -> f32 {
	if score.is_nan() { f32::NEG_INFINITY } else { score }
}

fn apply_order(items: Vec<Item>, order: &[usize]) -> Vec<Item> {
	let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();

	order.iter().filter_map(|index| slots.get_mut(*index).and_then(Option::take)).collect()
}

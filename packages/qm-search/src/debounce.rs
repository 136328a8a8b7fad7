use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::version::{Query, VersionCounter};

/// What became of a query after its debounce wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
	/// Quiet period elapsed and the query is still the newest one.
	Ready,
	/// A newer query (or shutdown) canceled the wait.
	Canceled,
	/// The wait ran out but the version moved on anyway.
	Stale,
}

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
	delay: Duration,
}
impl Debouncer {
	/// `delay` is expected to be clamped already by the settings layer.
	pub fn new(delay: Duration) -> Self {
		Self { delay }
	}

	/// Waits out the quiet period for `query`. Empty queries skip the wait so the list can be
	/// cleared at once.
	pub async fn settle(
		&self,
		query: &Query,
		versions: &VersionCounter,
		cancel: &CancellationToken,
	) -> Settle {
		if cancel.is_cancelled() {
			return Settle::Canceled;
		}

		if !query.is_empty() {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Settle::Canceled,
				_ = time::sleep(self.delay) => {},
			}
		}

		if versions.is_current(query.version) { Settle::Ready } else { Settle::Stale }
	}
}

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEBOUNCE_MIN_MS: u64 = 300;
pub const DEBOUNCE_MAX_MS: u64 = 2_000;
pub const MAX_RESULTS_MIN: u64 = 1;
pub const MAX_RESULTS_MAX: u64 = 200;
pub const GATE_TIMEOUT_FLOOR_MS: u64 = 1_500;

/// Settings as stored by the UI. Every value is optional so that the environment and the
/// built-in defaults can fill the gaps in [`Config::resolve`](crate::Config::resolve).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub bookmarks: Bookmarks,
	pub rerank: Rerank,
	pub search: Search,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Bookmarks {
	pub api_base: Option<String>,
	pub api_key: Option<String>,
	pub path: Option<String>,
	/// Name of the query-string parameter carrying the search text.
	pub query_param: Option<String>,
	pub timeout_ms: Option<u64>,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Rerank {
	pub enabled: Option<bool>,
	pub api_base: Option<String>,
	pub api_key: Option<String>,
	pub path: Option<String>,
	pub model: Option<String>,
	pub top_n: Option<u32>,
	pub timeout_ms: Option<u64>,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Search {
	pub debounce_ms: Option<u64>,
	pub max_results: Option<u64>,
}

/// Fully resolved settings snapshot consumed by the providers and the search pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
	pub log_level: String,
	pub bookmarks: BookmarkProviderConfig,
	/// Present only when reordering is enabled.
	pub rerank: Option<RerankProviderConfig>,
	pub search: SearchTuning,
}

#[derive(Debug, Clone)]
pub struct BookmarkProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub query_param: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct RerankProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub top_n: Option<u32>,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

/// Timing and size knobs of the search pipeline.
///
/// Out-of-range inputs are clamped here, so the pipeline never sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTuning {
	pub debounce: Duration,
	pub max_results: usize,
	pub rerank_enabled: bool,
}
impl SearchTuning {
	pub fn new(debounce_ms: u64, max_results: u64, rerank_enabled: bool) -> Self {
		let debounce_ms = debounce_ms.clamp(DEBOUNCE_MIN_MS, DEBOUNCE_MAX_MS);
		let max_results = max_results.clamp(MAX_RESULTS_MIN, MAX_RESULTS_MAX) as usize;

		Self { debounce: Duration::from_millis(debounce_ms), max_results, rerank_enabled }
	}

	/// Bounded wait for the previous search to vacate the gate: three debounce intervals, never
	/// less than [`GATE_TIMEOUT_FLOOR_MS`].
	pub fn gate_timeout(&self) -> Duration {
		(self.debounce * 3).max(Duration::from_millis(GATE_TIMEOUT_FLOOR_MS))
	}
}
impl Default for SearchTuning {
	fn default() -> Self {
		Self::new(DEBOUNCE_MIN_MS, 20, false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamps_debounce_and_max_results() {
		let low = SearchTuning::new(10, 0, false);

		assert_eq!(low.debounce, Duration::from_millis(300));
		assert_eq!(low.max_results, 1);

		let high = SearchTuning::new(9_000, 5_000, true);

		assert_eq!(high.debounce, Duration::from_millis(2_000));
		assert_eq!(high.max_results, 200);
	}

	#[test]
	fn gate_timeout_has_floor() {
		assert_eq!(SearchTuning::new(300, 20, false).gate_timeout(), Duration::from_millis(1_500));
		assert_eq!(SearchTuning::new(700, 20, false).gate_timeout(), Duration::from_millis(2_100));
	}
}

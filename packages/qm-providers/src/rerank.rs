use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use qm_config::RerankProviderConfig;

/// One reranker verdict: a position in the submitted document list and its relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
	pub index: usize,
	pub score: f32,
}

#[derive(Clone)]
pub struct RerankClient {
	client: Client,
	cfg: RerankProviderConfig,
}
impl RerankClient {
	pub fn new(client: Client, cfg: RerankProviderConfig) -> Self {
		Self { client, cfg }
	}

	pub async fn rerank(&self, query: &str, docs: &[String]) -> Result<Vec<RerankHit>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let mut body =
			serde_json::json!({ "model": self.cfg.model, "query": query, "documents": docs });

		if let Some(top_n) = self.cfg.top_n {
			body["top_n"] = Value::from(top_n);
		}

		let res = self
			.client
			.post(url)
			.timeout(Duration::from_millis(self.cfg.timeout_ms))
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_rerank_response(json)
	}
}

/// Hits are returned in provider order; range checks against the submitted documents are the
/// caller's concern.
fn parse_rerank_response(json: Value) -> Result<Vec<RerankHit>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::response_format("Rerank response is missing results array."))?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| Error::response_format("Rerank result missing index."))? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::response_format("Rerank result missing score."))? as f32;

		hits.push(RerankHit { index, score });
	}

	Ok(hits)
}

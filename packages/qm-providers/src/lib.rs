pub mod bookmarks;
pub mod rerank;

mod error;
mod item;

pub use error::{Error, Result};
pub use item::Item;
pub use rerank::RerankHit;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

/// Builds the process-wide connection pool. Timeouts are applied per request so one client can
/// serve providers with different limits.
pub fn http_client() -> Result<Client> {
	Ok(Client::builder().build()?)
}

/// Headers for a single request. Built fresh per call so concurrent requests never share
/// mutable header state.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::configuration("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::{Error, Item, Result};
use qm_config::BookmarkProviderConfig;

const NESTED_ARRAY_KEYS: [&str; 3] = ["response", "results", "items"];

/// Bookmark search endpoint bound to the shared connection pool.
#[derive(Clone)]
pub struct BookmarkClient {
	client: Client,
	cfg: BookmarkProviderConfig,
}
impl BookmarkClient {
	pub fn new(client: Client, cfg: BookmarkProviderConfig) -> Self {
		Self { client, cfg }
	}

	pub async fn search(&self, query: &str) -> Result<Vec<Item>> {
		let endpoint = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let url = Url::parse_with_params(&endpoint, &[(self.cfg.query_param.as_str(), query)])
			.map_err(|err| Error::configuration(format!("Invalid bookmark search URL: {err}.")))?;
		let res = self
			.client
			.get(url)
			.timeout(Duration::from_millis(self.cfg.timeout_ms))
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let items = parse_search_response(json)?;

		tracing::debug!(query_len = query.len(), count = items.len(), "Bookmark search returned.");

		Ok(items)
	}
}

fn parse_search_response(json: Value) -> Result<Vec<Item>> {
	let entries = find_entries(&json)
		.ok_or_else(|| Error::response_format("Bookmark search response is missing an item array."))?;

	entries.iter().map(parse_item).collect()
}

fn find_entries(json: &Value) -> Option<&Vec<Value>> {
	if let Some(entries) = json.as_array() {
		return Some(entries);
	}

	if let Some(data) = json.get("data") {
		if let Some(entries) = data.as_array() {
			return Some(entries);
		}
		if let Some(entries) = data.get("links").and_then(Value::as_array) {
			return Some(entries);
		}
	}

	NESTED_ARRAY_KEYS.iter().find_map(|key| json.get(*key).and_then(Value::as_array))
}

fn parse_item(entry: &Value) -> Result<Item> {
	let Some(object) = entry.as_object() else {
		return Err(Error::response_format("Bookmark entry must be an object."));
	};
	let tags: Vec<String> = object
		.get("tags")
		.and_then(Value::as_array)
		.map(|tags| {
			tags.iter()
				.filter_map(|tag| tag.as_str().or_else(|| tag.get("name").and_then(Value::as_str)))
				.map(str::to_string)
				.collect()
		})
		.unwrap_or_default();
	let collection_name = object
		.get("collectionName")
		.and_then(Value::as_str)
		.or_else(|| object.get("collection").and_then(|c| c.get("name")).and_then(Value::as_str))
		.unwrap_or_default()
		.to_string();

	Ok(Item {
		title: first_text(object, &["title", "name"]),
		description: first_text(object, &["description", "subtitle"]),
		url: first_text(object, &["url"]),
		tags,
		collection_name,
	})
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> String {
	keys.iter()
		.find_map(|key| object.get(*key).and_then(Value::as_str))
		.unwrap_or_default()
		.to_string()
}

use serde::{Deserialize, Serialize};

/// A bookmark as returned by the search API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	pub title: String,
	pub description: String,
	pub url: String,
	pub tags: Vec<String>,
	pub collection_name: String,
}
impl Item {
	/// Placeholder row shown in place of results when a search fails.
	pub fn diagnostic(message: impl Into<String>) -> Self {
		Self { title: "Search failed".to_string(), description: message.into(), ..Self::default() }
	}

	/// Text sent to the reranker for this item.
	pub fn rerank_document(&self) -> String {
		let mut parts = Vec::with_capacity(5);

		for field in [&self.title, &self.description, &self.url] {
			if !field.trim().is_empty() {
				parts.push(field.trim().to_string());
			}
		}

		if !self.tags.is_empty() {
			parts.push(format!("Tags: {}", self.tags.join(", ")));
		}
		if !self.collection_name.trim().is_empty() {
			parts.push(format!("Collection: {}", self.collection_name.trim()));
		}

		parts.join("\n")
	}
}

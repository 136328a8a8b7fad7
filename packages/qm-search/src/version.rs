use std::sync::atomic::{AtomicU64, Ordering};

/// A query text stamped with the version it was typed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	pub text: String,
	pub version: u64,
}
impl Query {
	pub fn new(text: impl Into<String>, version: u64) -> Self {
		Self { text: text.into(), version }
	}

	/// Whitespace-only text counts as no query.
	pub fn is_empty(&self) -> bool {
		self.text.trim().is_empty()
	}
}

/// Monotonic query version. Version `0` means nothing has been typed yet.
#[derive(Debug, Default)]
pub struct VersionCounter {
	current: AtomicU64,
}
impl VersionCounter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bump(&self) -> u64 {
		self.current.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn current(&self) -> u64 {
		self.current.load(Ordering::SeqCst)
	}

	pub fn is_current(&self, version: u64) -> bool {
		self.current() == version
	}
}

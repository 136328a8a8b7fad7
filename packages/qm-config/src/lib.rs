mod error;
mod resolve;
mod types;

pub use error::{Error, Result};
pub use resolve::{resolve, resolve_optional};
pub use types::{
	Bookmarks, BookmarkProviderConfig, Config, DEBOUNCE_MAX_MS, DEBOUNCE_MIN_MS,
	GATE_TIMEOUT_FLOOR_MS, MAX_RESULTS_MAX, MAX_RESULTS_MIN, Rerank, RerankProviderConfig, Search,
	SearchTuning, Service, Settings,
};

use std::{env, fs, path::Path};

use serde_json::{Map, Value};

pub const ENV_LOG: &str = "QUICKMARK_LOG";
pub const ENV_API_BASE: &str = "QUICKMARK_API_BASE";
pub const ENV_API_KEY: &str = "QUICKMARK_API_KEY";
pub const ENV_RERANK_ENABLED: &str = "QUICKMARK_RERANK_ENABLED";
pub const ENV_RERANK_API_BASE: &str = "QUICKMARK_RERANK_API_BASE";
pub const ENV_RERANK_API_KEY: &str = "QUICKMARK_RERANK_API_KEY";
pub const ENV_RERANK_MODEL: &str = "QUICKMARK_RERANK_MODEL";
pub const ENV_DEBOUNCE_MS: &str = "QUICKMARK_DEBOUNCE_MS";
pub const ENV_MAX_RESULTS: &str = "QUICKMARK_MAX_RESULTS";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SEARCH_PATH: &str = "/api/v1/search";
const DEFAULT_QUERY_PARAM: &str = "q";
const DEFAULT_RERANK_PATH: &str = "/v1/rerank";
const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RERANK_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_RESULTS: u64 = 20;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Checks what can be judged from the file alone. Required values may still arrive from the
/// environment, so their absence is reported by [`Config::resolve`] instead.
pub fn validate(cfg: &Config) -> Result<()> {
	for (label, timeout) in
		[("bookmarks.timeout_ms", cfg.bookmarks.timeout_ms), ("rerank.timeout_ms", cfg.rerank.timeout_ms)]
	{
		if timeout == Some(0) {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}
	for (label, base) in
		[("bookmarks.api_base", &cfg.bookmarks.api_base), ("rerank.api_base", &cfg.rerank.api_base)]
	{
		if let Some(base) = base
			&& !resolve::http_url(base)
		{
			return Err(Error::Validation {
				message: format!("{label} must start with http:// or https://."),
			});
		}
	}
	for (label, path) in
		[("bookmarks.path", &cfg.bookmarks.path), ("rerank.path", &cfg.rerank.path)]
	{
		if let Some(path) = path
			&& !path.starts_with('/')
		{
			return Err(Error::Validation { message: format!("{label} must start with /.") });
		}
	}
	for (label, headers) in [
		("bookmarks.default_headers", &cfg.bookmarks.default_headers),
		("rerank.default_headers", &cfg.rerank.default_headers),
	] {
		validate_headers(label, headers)?;
	}

	if let Some(top_n) = cfg.rerank.top_n
		&& top_n == 0
	{
		return Err(Error::Validation {
			message: "rerank.top_n must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

impl Config {
	/// Resolves every value against the process environment.
	pub fn resolve(&self) -> Result<Settings> {
		self.resolve_with(|key| env::var(key).ok())
	}

	/// Resolves every value with `lookup` standing in for the environment.
	pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
		let log_level = resolve(
			self.service.log_level.clone(),
			lookup(ENV_LOG),
			DEFAULT_LOG_LEVEL.to_string(),
			resolve::non_empty,
		);
		let bookmarks = self.resolve_bookmarks(&lookup)?;
		let rerank_enabled = resolve(
			self.rerank.enabled,
			lookup(ENV_RERANK_ENABLED).as_deref().and_then(resolve::parse_bool),
			false,
			|_| true,
		);
		let rerank = if rerank_enabled { Some(self.resolve_rerank(&lookup)?) } else { None };
		let debounce_ms = resolve(
			self.search.debounce_ms,
			lookup(ENV_DEBOUNCE_MS).and_then(|raw| raw.trim().parse().ok()),
			DEBOUNCE_MIN_MS,
			|_| true,
		);
		let max_results = resolve(
			self.search.max_results,
			lookup(ENV_MAX_RESULTS).and_then(|raw| raw.trim().parse().ok()),
			DEFAULT_MAX_RESULTS,
			|_| true,
		);
		let search = SearchTuning::new(debounce_ms, max_results, rerank_enabled);

		Ok(Settings { log_level, bookmarks, rerank, search })
	}

	fn resolve_bookmarks(
		&self,
		lookup: &impl Fn(&str) -> Option<String>,
	) -> Result<BookmarkProviderConfig> {
		let api_base =
			resolve_optional(self.bookmarks.api_base.clone(), lookup(ENV_API_BASE), resolve::http_url)
				.ok_or_else(|| Error::Validation {
					message: format!(
						"bookmarks.api_base must be set in the config file or via {ENV_API_BASE}."
					),
				})?;
		let api_key =
			resolve_optional(self.bookmarks.api_key.clone(), lookup(ENV_API_KEY), resolve::non_empty)
				.ok_or_else(|| Error::Validation {
					message: format!(
						"bookmarks.api_key must be set in the config file or via {ENV_API_KEY}."
					),
				})?;

		Ok(BookmarkProviderConfig {
			api_base: trim_base(&api_base),
			api_key: api_key.trim().to_string(),
			path: self.bookmarks.path.clone().unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string()),
			query_param: self
				.bookmarks
				.query_param
				.clone()
				.unwrap_or_else(|| DEFAULT_QUERY_PARAM.to_string()),
			timeout_ms: self.bookmarks.timeout_ms.unwrap_or(DEFAULT_SEARCH_TIMEOUT_MS),
			default_headers: self.bookmarks.default_headers.clone(),
		})
	}

	fn resolve_rerank(&self, lookup: &impl Fn(&str) -> Option<String>) -> Result<RerankProviderConfig> {
		let api_base = resolve_optional(
			self.rerank.api_base.clone(),
			lookup(ENV_RERANK_API_BASE),
			resolve::http_url,
		)
		.ok_or_else(|| Error::Validation {
			message: format!(
				"rerank.api_base must be set when reranking is enabled (or via {ENV_RERANK_API_BASE})."
			),
		})?;
		let api_key = resolve_optional(
			self.rerank.api_key.clone(),
			lookup(ENV_RERANK_API_KEY),
			resolve::non_empty,
		)
		.ok_or_else(|| Error::Validation {
			message: format!(
				"rerank.api_key must be set when reranking is enabled (or via {ENV_RERANK_API_KEY})."
			),
		})?;
		let model =
			resolve_optional(self.rerank.model.clone(), lookup(ENV_RERANK_MODEL), resolve::non_empty)
				.ok_or_else(|| Error::Validation {
					message: format!(
						"rerank.model must be set when reranking is enabled (or via {ENV_RERANK_MODEL})."
					),
				})?;

		Ok(RerankProviderConfig {
			api_base: trim_base(&api_base),
			api_key: api_key.trim().to_string(),
			path: self.rerank.path.clone().unwrap_or_else(|| DEFAULT_RERANK_PATH.to_string()),
			model: model.trim().to_string(),
			top_n: self.rerank.top_n,
			timeout_ms: self.rerank.timeout_ms.unwrap_or(DEFAULT_RERANK_TIMEOUT_MS),
			default_headers: self.rerank.default_headers.clone(),
		})
	}
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.service.log_level,
		&mut cfg.bookmarks.api_base,
		&mut cfg.bookmarks.api_key,
		&mut cfg.bookmarks.path,
		&mut cfg.bookmarks.query_param,
		&mut cfg.rerank.api_base,
		&mut cfg.rerank.api_key,
		&mut cfg.rerank.path,
		&mut cfg.rerank.model,
	] {
		if value.as_deref().map(|raw| raw.trim().is_empty()).unwrap_or(false) {
			*value = None;
		}
	}
}

fn validate_headers(label: &str, headers: &Map<String, Value>) -> Result<()> {
	for (key, value) in headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("{label}.{key} must be a string."),
			});
		}
	}

	Ok(())
}

fn trim_base(raw: &str) -> String {
	raw.trim().trim_end_matches('/').to_string()
}

use std::{
	collections::HashMap,
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use qm_config::{Config, ENV_API_BASE, ENV_API_KEY, ENV_DEBOUNCE_MS, ENV_RERANK_ENABLED, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
log_level = "debug"

[bookmarks]
api_base = "https://links.example.com/"
api_key = "secret"
timeout_ms = 2500

[bookmarks.default_headers]
"X-Client" = "quickmark"

[rerank]
enabled = false

[search]
debounce_ms = 450
max_results = 15
"#;

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("qm_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_str(payload: &str) -> qm_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = qm_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn no_env(_: &str) -> Option<String> {
	None
}

#[test]
fn loads_and_resolves_sample_config() {
	let cfg = load_str(SAMPLE_CONFIG_TOML).expect("Failed to load sample config.");
	let settings = cfg.resolve_with(no_env).expect("Failed to resolve sample config.");

	assert_eq!(settings.log_level, "debug");
	assert_eq!(settings.bookmarks.api_base, "https://links.example.com");
	assert_eq!(settings.bookmarks.api_key, "secret");
	assert_eq!(settings.bookmarks.path, "/api/v1/search");
	assert_eq!(settings.bookmarks.query_param, "q");
	assert_eq!(settings.bookmarks.timeout_ms, 2_500);
	assert!(settings.rerank.is_none());
	assert_eq!(settings.search.debounce, Duration::from_millis(450));
	assert_eq!(settings.search.max_results, 15);
	assert!(!settings.search.rerank_enabled);
	assert_eq!(settings.search.gate_timeout(), Duration::from_millis(1_500));
}

#[test]
fn missing_file_reports_path() {
	let err = qm_config::load(&PathBuf::from("/nonexistent/quickmark.toml"))
		.expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn zero_timeout_is_rejected() {
	let err = load_str("[bookmarks]\ntimeout_ms = 0\n").expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(
		message.contains("bookmarks.timeout_ms must be greater than zero."),
		"Unexpected error message: {message}"
	);
}

#[test]
fn non_string_header_is_rejected() {
	let err = load_str("[rerank.default_headers]\nX-Retry = 3\n")
		.expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(
		message.contains("rerank.default_headers.X-Retry must be a string."),
		"Unexpected error message: {message}"
	);
}

#[test]
fn non_http_base_is_rejected() {
	let err = load_str("[bookmarks]\napi_base = \"ftp://links\"\n")
		.expect_err("Expected validation error.");

	assert!(err.to_string().contains("bookmarks.api_base must start with http"));
}

#[test]
fn relative_endpoint_path_is_rejected() {
	let err = load_str("[bookmarks]\npath = \"api/search\"\n")
		.expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(
		message.contains("bookmarks.path must start with /."),
		"Unexpected error message: {message}"
	);

	let err = load_str("[rerank]\npath = \"v1/rerank\"\n").expect_err("Expected validation error.");

	assert!(err.to_string().contains("rerank.path must start with /."));
}

#[test]
fn blank_values_fall_back_to_environment() {
	let cfg = load_str("[bookmarks]\napi_base = \"  \"\napi_key = \"\"\n")
		.expect("Failed to load config.");
	let env = HashMap::from([
		(ENV_API_BASE, "http://127.0.0.1:3000"),
		(ENV_API_KEY, "env-key"),
		(ENV_DEBOUNCE_MS, "10"),
	]);
	let settings = cfg
		.resolve_with(|key| env.get(key).map(|value| value.to_string()))
		.expect("Failed to resolve config.");

	assert_eq!(settings.bookmarks.api_base, "http://127.0.0.1:3000");
	assert_eq!(settings.bookmarks.api_key, "env-key");
	assert_eq!(settings.search.debounce, Duration::from_millis(300));
}

#[test]
fn missing_credentials_are_a_configuration_error() {
	let cfg = load_str("[bookmarks]\napi_base = \"https://links.example.com\"\n")
		.expect("Failed to load config.");
	let err = cfg.resolve_with(no_env).expect_err("Expected missing api_key.");

	assert!(err.to_string().contains("bookmarks.api_key must be set"));
}

#[test]
fn enabling_rerank_requires_provider_settings() {
	let cfg = load_str(&SAMPLE_CONFIG_TOML.replace("[rerank]\nenabled = false\n", ""))
		.expect("Failed to load config.");
	let env = HashMap::from([(ENV_RERANK_ENABLED, "true")]);
	let err = cfg
		.resolve_with(|key| env.get(key).map(|value| value.to_string()))
		.expect_err("Expected rerank validation error.");

	assert!(err.to_string().contains("rerank.api_base must be set"));
}

#[test]
fn rerank_settings_resolve_when_enabled() {
	let payload = format!(
		"{SAMPLE_CONFIG_TOML}\n[rerank]\nenabled = true\napi_base = \"https://rerank.example.com\"\napi_key = \"rk\"\nmodel = \"rerank-small\"\ntop_n = 10\n"
	)
	.replace("[rerank]\nenabled = false\n", "");
	let cfg = load_str(&payload).expect("Failed to load config.");
	let settings = cfg.resolve_with(no_env).expect("Failed to resolve config.");
	let rerank = settings.rerank.expect("Expected rerank settings.");

	assert!(settings.search.rerank_enabled);
	assert_eq!(rerank.path, "/v1/rerank");
	assert_eq!(rerank.model, "rerank-small");
	assert_eq!(rerank.top_n, Some(10));
	assert_eq!(rerank.timeout_ms, 5_000);
}

#[test]
fn ui_setting_beats_environment() {
	let cfg = load_str(SAMPLE_CONFIG_TOML).expect("Failed to load sample config.");
	let env = HashMap::from([(ENV_RERANK_ENABLED, "true"), (ENV_DEBOUNCE_MS, "900")]);
	let settings = cfg
		.resolve_with(|key| env.get(key).map(|value| value.to_string()))
		.expect("Failed to resolve config.");

	assert!(!settings.search.rerank_enabled);
	assert_eq!(settings.search.debounce, Duration::from_millis(450));
}

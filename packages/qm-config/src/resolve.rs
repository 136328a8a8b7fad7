/// Picks the first value that passes `valid`, preferring the UI setting over the environment
/// and falling back to `default`.
pub fn resolve<T>(ui: Option<T>, env: Option<T>, default: T, valid: impl Fn(&T) -> bool) -> T {
	resolve_optional(ui, env, valid).unwrap_or(default)
}

/// Same precedence as [`resolve`] for values that have no default.
pub fn resolve_optional<T>(ui: Option<T>, env: Option<T>, valid: impl Fn(&T) -> bool) -> Option<T> {
	ui.filter(|value| valid(value)).or_else(|| env.filter(|value| valid(value)))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

pub(crate) fn non_empty(value: &String) -> bool {
	!value.trim().is_empty()
}

pub(crate) fn http_url(value: &String) -> bool {
	let value = value.trim();

	value.starts_with("http://") || value.starts_with("https://")
}

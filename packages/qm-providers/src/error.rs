use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classified provider failure. Messages are kept as text so a batch carrying the error can be
/// cloned and rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Network error: {message}")]
	Network { message: String },
	#[error("Request timed out: {message}")]
	Timeout { message: String },
	#[error("DNS lookup failed: {message}")]
	Dns { message: String },
	#[error("TLS error: {message}")]
	Ssl { message: String },
	#[error("Unexpected response format: {message}")]
	ResponseFormat { message: String },
	#[error("Request canceled.")]
	Canceled,
}
impl Error {
	pub fn configuration(message: impl Into<String>) -> Self {
		Self::Configuration { message: message.into() }
	}

	pub fn response_format(message: impl Into<String>) -> Self {
		Self::ResponseFormat { message: message.into() }
	}

	/// Whether the same request could succeed on a later attempt without any settings change.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Network { .. } | Self::Timeout { .. } | Self::Dns { .. })
	}
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		let message = error_chain(&err);

		if err.is_timeout() {
			return Self::Timeout { message };
		}
		if err.is_decode() {
			return Self::ResponseFormat { message };
		}
		if err.is_builder() {
			return Self::Configuration { message };
		}
		if let Some(status) = err.status() {
			return match status.as_u16() {
				401 | 403 => Self::Configuration {
					message: format!("credential rejected ({status})"),
				},
				_ => Self::Network { message: format!("server returned {status}") },
			};
		}

		if !err.is_connect() {
			return Self::Network { message };
		}

		let lowered = message.to_ascii_lowercase();

		if ["dns", "resolve", "lookup address", "name or service not known"]
			.iter()
			.any(|needle| lowered.contains(needle))
		{
			return Self::Dns { message };
		}
		if ["certificate", "tls", "ssl", "handshake"].iter().any(|needle| lowered.contains(needle)) {
			return Self::Ssl { message };
		}

		Self::Network { message }
	}
}
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::ResponseFormat { message: err.to_string() }
	}
}
impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}
impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}

fn error_chain(err: &dyn StdError) -> String {
	let mut message = err.to_string();
	let mut source = err.source();

	while let Some(inner) = source {
		message.push_str(": ");
		message.push_str(&inner.to_string());

		source = inner.source();
	}

	message
}

//! Client-level error types shared across the codec, token client, and session orchestrator.

// self
use crate::{_prelude::*, obs::Operation};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure; no HTTP response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Malformed token or unparsable JSON.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Token, revoke, or resource endpoint rejected the request.
	#[error("The {operation} call was rejected with HTTP {status}{}.", describe(.body))]
	Auth {
		/// Operation that failed.
		operation: Operation,
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Captured response body.
		body: ResponseBody,
	},
	/// Protected resource does not exist.
	#[error("Protected resource was not found: {url}.")]
	NotFound {
		/// Requested resource URL (without query string).
		url: String,
		/// Captured response body.
		body: ResponseBody,
	},
	/// Protected API returned any other non-success status.
	#[error("Protected API call failed with HTTP {status}{}.", describe(.body))]
	Api {
		/// HTTP status code returned by the API.
		status: u16,
		/// Captured response body.
		body: ResponseBody,
	},
	/// In-flight request was abandoned because the session was revoked or reset.
	#[error("Request was cancelled because the session was reset.")]
	Cancelled,
	/// Session operation requires tokens (or an identity) that the session does not hold.
	#[error("Session is not signed in.")]
	NotSignedIn,
}
impl Error {
	/// Returns the HTTP status code carried by response-level failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth { status, .. } | Self::Api { status, .. } => Some(*status),
			Self::NotFound { .. } => Some(404),
			_ => None,
		}
	}

	/// Returns the captured response body for response-level failures.
	pub fn body(&self) -> Option<&ResponseBody> {
		match self {
			Self::Auth { body, .. } | Self::NotFound { body, .. } | Self::Api { body, .. } =>
				Some(body),
			_ => None,
		}
	}

	/// Returns true when the failure is a network-level transport error.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required setting was not provided.
	#[error("Required setting `{name}` is missing.")]
	MissingSetting {
		/// Setting name (environment variable spelling).
		name: &'static str,
	},
	/// Setting could not be parsed.
	#[error("Setting `{name}` is invalid: {reason}.")]
	InvalidSetting {
		/// Setting name (environment variable spelling).
		name: &'static str,
		/// Parser-supplied reason.
		reason: String,
	},
	/// Setting holds an unparsable URL.
	#[error("Setting `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name (environment variable spelling).
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint URL must use HTTPS unless it targets a loopback host.
	#[error("Setting `{name}` must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Setting name (environment variable spelling).
		name: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Scope list failed validation.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint returned an `expires_in` that does not fit a timestamp.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Refresh or revoke was requested without a refresh token.
	#[error("Token set is missing a refresh token.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, deadline).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {operation}.")]
	Network {
		/// Operation that failed.
		operation: Operation,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// Request did not complete within the configured deadline.
	#[error("The {operation} call timed out after {}ms.", .after.as_millis())]
	TimedOut {
		/// Operation that timed out.
		operation: Operation,
		/// Deadline that elapsed.
		after: StdDuration,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(operation: Operation, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { operation, source: Box::new(src) }
	}
}

/// Failures decoding tokens or JSON payloads.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Compact token does not contain a payload segment.
	#[error("Token has {segments} dot-separated segment(s); at least two are required.")]
	MalformedToken {
		/// Number of segments observed.
		segments: usize,
	},
	/// Payload segment is not valid base64.
	#[error("Token payload is not valid base64.")]
	InvalidBase64(#[from] base64::DecodeError),
	/// Payload decoded but is not a JSON claims object.
	#[error("Token payload is not a valid claims object.")]
	InvalidClaims(#[source] JsonPathError),
	/// Success response body is not the expected JSON document.
	#[error("The {operation} response is not valid JSON.")]
	InvalidResponse {
		/// Operation whose response failed to parse.
		operation: Operation,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}

/// Response body captured alongside a failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
	/// No body was returned.
	#[default]
	Empty,
	/// Body parsed as JSON.
	Json(serde_json::Value),
	/// Body was not JSON; kept verbatim (lossy UTF-8).
	Text(String),
}
impl ResponseBody {
	const PREVIEW_LIMIT: usize = 256;

	/// Captures raw bytes, preferring JSON when the bytes parse.
	pub fn capture(bytes: &[u8]) -> Self {
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Self::Empty;
		}

		match serde_json::from_slice(bytes) {
			Ok(value) => Self::Json(value),
			Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
		}
	}

	/// OAuth `error` code, when the body is a JSON error document.
	pub fn oauth_error(&self) -> Option<&str> {
		self.json_str("error")
	}

	/// OAuth `error_description`, when the body is a JSON error document.
	pub fn error_description(&self) -> Option<&str> {
		self.json_str("error_description")
	}

	/// Short human-readable preview of the body.
	pub fn preview(&self) -> Option<String> {
		match self {
			Self::Empty => None,
			Self::Json(value) => Some(truncate(value.to_string())),
			Self::Text(text) => Some(truncate(text.trim().to_owned())),
		}
	}

	fn json_str(&self, key: &str) -> Option<&str> {
		match self {
			Self::Json(value) => value.get(key).and_then(serde_json::Value::as_str),
			_ => None,
		}
	}
}

fn truncate(body: String) -> String {
	if body.chars().count() <= ResponseBody::PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ResponseBody::PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn describe(body: &ResponseBody) -> String {
	match (body.oauth_error(), body.error_description()) {
		(Some(code), Some(description)) => format!(" ({code}: {description})"),
		(Some(code), None) => format!(" ({code})"),
		_ => body.preview().map(|preview| format!(": {preview}")).unwrap_or_default(),
	}
}

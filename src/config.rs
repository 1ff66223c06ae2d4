//! Client configuration shared by the token client and the session orchestrator.
//!
//! Configuration is an explicit value built through [`ClientConfigBuilder`] (or loaded from
//! environment variables) and passed in; nothing is read from ambient globals at call time.

/// Builder API for assembling client configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList, TokenSecret},
	error::ConfigError,
};

/// Environment variable naming the identity provider base URL.
pub const ENV_ID_PROVIDER_URL: &str = "ID_PROVIDER_URL";
/// Environment variable naming the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
/// Environment variable naming the optional OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "CLIENT_SECRET";
/// Environment variable naming the registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "REDIRECT_URI";
/// Environment variable naming the protected API base URL.
pub const ENV_API_URL: &str = "API_URL";
/// Environment variable overriding the requested scopes (space- or `+`-separated).
pub const ENV_SCOPES: &str = "SCOPES";
/// Environment variable overriding the per-request deadline, in whole seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Identity provider endpoints derived from the base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityEndpoints {
	/// Hosted sign-in page (`/login`).
	pub login: Url,
	/// Token endpoint (`/oauth2/token`).
	pub token: Url,
	/// Revocation endpoint (`/oauth2/revoke`).
	pub revoke: Url,
}
impl IdentityEndpoints {
	fn derive(base: &Url) -> Result<Self, ConfigError> {
		Ok(Self {
			login: join_path(ENV_ID_PROVIDER_URL, base, &["login"])?,
			token: join_path(ENV_ID_PROVIDER_URL, base, &["oauth2", "token"])?,
			revoke: join_path(ENV_ID_PROVIDER_URL, base, &["oauth2", "revoke"])?,
		})
	}
}

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Identity provider base URL.
	pub id_provider_url: Url,
	/// Endpoints derived from [`id_provider_url`](Self::id_provider_url).
	pub endpoints: IdentityEndpoints,
	/// Protected API base URL.
	pub api_url: Url,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Optional client secret, sent in request bodies when present.
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI registered with the identity provider.
	///
	/// Kept verbatim (after validation) because the provider compares it byte-for-byte with
	/// the registered value; URL normalization would append a trailing `/`.
	pub redirect_uri: String,
	/// Scopes requested at sign-in.
	pub scopes: ScopeList,
	/// Deadline applied to every outbound call.
	pub request_timeout: StdDuration,
}
impl ClientConfig {
	/// Deadline used when none is configured.
	pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates an empty builder.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	///
	/// Empty values are treated as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let mut builder = Self::builder();

		if let Some(value) = lookup(ENV_ID_PROVIDER_URL) {
			builder = builder.id_provider_url(value);
		}
		if let Some(value) = lookup(ENV_API_URL) {
			builder = builder.api_url(value);
		}
		if let Some(value) = lookup(ENV_CLIENT_ID) {
			builder = builder.client_id(value);
		}
		if let Some(value) = lookup(ENV_CLIENT_SECRET) {
			builder = builder.client_secret(value);
		}
		if let Some(value) = lookup(ENV_REDIRECT_URI) {
			builder = builder.redirect_uri(value);
		}
		if let Some(value) = lookup(ENV_SCOPES) {
			builder = builder.scopes(ScopeList::from_str(&value)?);
		}
		if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
			let secs = value.trim().parse::<u64>().map_err(|e| ConfigError::InvalidSetting {
				name: ENV_REQUEST_TIMEOUT_SECS,
				reason: e.to_string(),
			})?;

			builder = builder.request_timeout(StdDuration::from_secs(secs));
		}

		builder.build()
	}

	/// Resolves a protected API path (e.g. `protected/v1/users/1/rounds`) against
	/// [`api_url`](Self::api_url).
	///
	/// Each `/`-separated segment is percent-encoded on its own, so callers cannot escape the
	/// API base with `..` or smuggle query delimiters.
	pub fn api_endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let segments = path.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();

		if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
			return Err(ConfigError::InvalidSetting {
				name: "path",
				reason: format!("`{path}` contains a relative segment"),
			});
		}

		join_path(ENV_API_URL, &self.api_url, &segments)
	}
}

fn join_path(name: &'static str, base: &Url, segments: &[&str]) -> Result<Url, ConfigError> {
	let mut url = base.clone();

	url.set_query(None);
	url.set_fragment(None);
	url.path_segments_mut()
		.map_err(|_| ConfigError::InvalidSetting {
			name,
			reason: "URL cannot carry a path".into(),
		})?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

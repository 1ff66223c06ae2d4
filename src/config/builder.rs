// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList, TokenSecret},
	config::{
		ClientConfig, ENV_API_URL, ENV_CLIENT_ID, ENV_ID_PROVIDER_URL, ENV_REDIRECT_URI,
		ENV_REQUEST_TIMEOUT_SECS, IdentityEndpoints,
	},
	error::ConfigError,
};

/// Builder for [`ClientConfig`] values.
///
/// Setters accept raw strings; parsing and validation happen in [`build`](Self::build) so
/// every failure names the offending setting.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	/// Identity provider base URL.
	pub id_provider_url: Option<String>,
	/// Protected API base URL.
	pub api_url: Option<String>,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// Optional client secret.
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI registered with the identity provider.
	pub redirect_uri: Option<String>,
	/// Scopes requested at sign-in; defaults to [`ScopeList::rounds_default`].
	pub scopes: Option<ScopeList>,
	/// Per-request deadline; defaults to [`ClientConfig::DEFAULT_REQUEST_TIMEOUT`].
	pub request_timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Sets the identity provider base URL.
	pub fn id_provider_url(mut self, url: impl Into<String>) -> Self {
		self.id_provider_url = Some(url.into());

		self
	}

	/// Sets the protected API base URL.
	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.api_url = Some(url.into());

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: impl Into<String>) -> Self {
		self.redirect_uri = Some(url.into());

		self
	}

	/// Overrides the requested scopes.
	pub fn scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = Some(scopes);

		self
	}

	/// Overrides the per-request deadline.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let id_provider_url = parse_endpoint(ENV_ID_PROVIDER_URL, self.id_provider_url)?;
		let api_url = parse_endpoint(ENV_API_URL, self.api_url)?;
		let client_id = ClientId::new(required(ENV_CLIENT_ID, self.client_id)?)?;
		let redirect_uri = required(ENV_REDIRECT_URI, self.redirect_uri)?.trim().to_owned();

		Url::parse(&redirect_uri)
			.map_err(|source| ConfigError::InvalidUrl { name: ENV_REDIRECT_URI, source })?;

		let request_timeout = self.request_timeout.unwrap_or(ClientConfig::DEFAULT_REQUEST_TIMEOUT);

		if request_timeout.is_zero() {
			return Err(ConfigError::InvalidSetting {
				name: ENV_REQUEST_TIMEOUT_SECS,
				reason: "timeout must be positive".into(),
			});
		}

		let scopes = match self.scopes {
			Some(scopes) if !scopes.is_empty() => scopes,
			_ => ScopeList::rounds_default(),
		};

		Ok(ClientConfig {
			endpoints: IdentityEndpoints::derive(&id_provider_url)?,
			id_provider_url,
			api_url,
			client_id,
			client_secret: self.client_secret.filter(|secret| !secret.expose().is_empty()),
			redirect_uri,
			scopes,
			request_timeout,
		})
	}
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	value.filter(|value| !value.trim().is_empty()).ok_or(ConfigError::MissingSetting { name })
}

fn parse_endpoint(name: &'static str, value: Option<String>) -> Result<Url, ConfigError> {
	let raw = required(name, value)?;
	let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })?;

	validate_endpoint(name, &url)?;

	Ok(url)
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.is_ok_and(|ip| ip.is_loopback()),
		None => false,
	}
}

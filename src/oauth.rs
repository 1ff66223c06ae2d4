//! Request construction and response mapping for the token, revocation, and resource calls.

pub use oauth2;

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	codec::{self, Params},
	error::{ConfigError, DecodeError, ResponseBody, TransportError},
	obs::Operation,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a client error.
	fn map_transport_error(&self, operation: Operation, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		operation: Operation,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(operation, *inner),
			err => map_generic_transport_error(operation, err),
		}
	}
}

/// Mapper for transports whose errors carry no extra classification.
///
/// Request-construction failures become [`ConfigError`]s, IO failures stay
/// [`TransportError::Io`], and everything else is a network failure.
#[derive(Clone, Debug, Default)]
pub struct GenericTransportErrorMapper;
impl<E> TransportErrorMapper<E> for GenericTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, operation: Operation, error: HttpClientError<E>) -> Error {
		map_generic_transport_error(operation, error)
	}
}

/// Successful token endpoint payload.
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct TokenResponse {
	access_token: String,
	#[serde(default)]
	id_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}
impl TokenResponse {
	/// Converts the payload, rejecting an `expires_in` that overflows the expiry timestamp.
	pub(crate) fn into_token_set(self, issued_at: OffsetDateTime) -> Result<TokenSet, ConfigError> {
		let mut set = TokenSet::new(self.access_token).issued_at(issued_at);

		if let Some(token) = self.id_token {
			set = set.with_id_token(token);
		}
		if let Some(token) = self.refresh_token {
			set = set.with_refresh_token(token);
		}
		if let Some(token_type) = self.token_type {
			set = set.with_token_type(token_type);
		}
		if let Some(secs) = self.expires_in.filter(|secs| *secs > 0) {
			let lifetime = Duration::seconds(secs);

			issued_at.checked_add(lifetime).ok_or(ConfigError::ExpiresInOutOfRange)?;

			set = set.with_expires_in(lifetime);
		}

		Ok(set)
	}
}

/// Builds a form-encoded POST for the token or revocation endpoint.
pub(crate) fn form_request(url: &Url, params: &Params) -> Result<HttpRequest> {
	Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
		.header(ACCEPT, HeaderValue::from_static(JSON_ACCEPT))
		.body(codec::encode_form(params))
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds a bearer-authenticated GET for the protected API.
pub(crate) fn bearer_request(url: &Url, access_token: &str) -> Result<HttpRequest> {
	let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
		.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

	authorization.set_sensitive(true);

	Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(AUTHORIZATION, authorization)
		.header(ACCEPT, HeaderValue::from_static(JSON_ACCEPT))
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

/// Rejects non-2xx token or revocation responses as [`Error::Auth`].
pub(crate) fn ensure_token_success(operation: Operation, response: &HttpResponse) -> Result<()> {
	let status = response.status();

	if status.is_success() {
		return Ok(());
	}

	Err(Error::Auth {
		operation,
		status: status.as_u16(),
		body: ResponseBody::capture(response.body()),
	})
}

/// Classifies non-2xx protected API responses.
pub(crate) fn ensure_resource_success(url: &Url, response: &HttpResponse) -> Result<()> {
	let status = response.status();

	if status.is_success() {
		return Ok(());
	}

	let body = ResponseBody::capture(response.body());

	Err(match status {
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN =>
			Error::Auth { operation: Operation::FetchResource, status: status.as_u16(), body },
		StatusCode::NOT_FOUND => {
			let mut url = url.clone();

			url.set_query(None);

			Error::NotFound { url: url.into(), body }
		},
		_ => Error::Api { status: status.as_u16(), body },
	})
}

/// Parses a success body as JSON, reporting the failing path on error.
pub(crate) fn parse_json<T>(operation: Operation, body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| DecodeError::InvalidResponse { operation, source })
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(operation: Operation, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::network(operation, err).into()
}

fn map_generic_transport_error<E>(operation: Operation, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		err => TransportError::network(operation, err).into(),
	}
}

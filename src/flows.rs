//! Token and resource operations issued by [`RoundsClient`].

pub mod common;

mod authorization_code;
mod metrics;
mod refresh;
mod resource;
mod revoke;

pub use metrics::{OperationCounters, OperationMetrics};

// self
use crate::{_prelude::*, config::ClientConfig, http::TokenHttpClient, oauth::TransportErrorMapper};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestRoundsClient = RoundsClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Stateless client for the identity provider and the protected rounds API.
///
/// The client owns the HTTP transport, the transport error mapper, and the validated
/// configuration. It never stores tokens; callers (usually a
/// [`Session`](crate::session::Session)) pass them in and decide what to do with failures.
/// Every call is bounded by [`ClientConfig::request_timeout`] and must run inside a Tokio
/// runtime with the time driver enabled.
pub struct RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated configuration.
	pub config: Arc<ClientConfig>,
	/// Per-operation attempt/success/failure counters.
	pub metrics: Arc<OperationMetrics>,
}
impl<C, M> RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: Arc::new(config),
			metrics: Default::default(),
		}
	}

	/// Returns the shared operation counters.
	pub fn metrics(&self) -> &OperationMetrics {
		&self.metrics
	}
}
#[cfg(feature = "reqwest")]
impl RoundsClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client that provisions its own reqwest transport (redirects disabled).
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<C, M> Debug for RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RoundsClient")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}

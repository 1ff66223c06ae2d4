//! Shared helpers for operation implementations (dispatch with deadline, instrumentation).

// crates.io
use oauth2::{AsyncHttpClient, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	codec::Params,
	error::TransportError,
	flows::RoundsClient,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, Operation, OperationSpan, Outcome},
};

impl<C, M> RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `request` through the transport, bounded by the configured deadline.
	pub(crate) async fn dispatch(
		&self,
		operation: Operation,
		request: HttpRequest,
	) -> Result<HttpResponse> {
		let handle = self.http_client.handle();
		let after = self.config.request_timeout;

		match tokio::time::timeout(after, handle.call(request)).await {
			Ok(Ok(response)) => Ok(response),
			Ok(Err(err)) => Err(self.transport_mapper.map_transport_error(operation, err)),
			Err(_) => Err(TransportError::TimedOut { operation, after }.into()),
		}
	}

	/// POSTs `params` to `url` and rejects non-2xx responses as [`Error::Auth`].
	pub(crate) async fn post_form(
		&self,
		operation: Operation,
		url: &Url,
		params: &Params,
	) -> Result<HttpResponse> {
		let request = oauth::form_request(url, params)?;
		let response = self.dispatch(operation, request).await?;

		oauth::ensure_token_success(operation, &response)?;

		Ok(response)
	}

	/// Wraps an operation in its span and records attempt/success/failure outcomes.
	pub(crate) async fn observe<F, T>(
		&self,
		operation: Operation,
		stage: &'static str,
		fut: F,
	) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let span = OperationSpan::new(operation, stage);

		self.record(operation, Outcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => self.record(operation, Outcome::Success),
			Err(_) => self.record(operation, Outcome::Failure),
		}

		result
	}

	/// Client secret, when configured.
	pub(crate) fn client_secret(&self) -> Option<&str> {
		self.config.client_secret.as_ref().map(|secret| secret.expose())
	}

	fn record(&self, operation: Operation, outcome: Outcome) {
		obs::record_outcome(operation, outcome);
		self.metrics.record(operation, outcome);
	}
}

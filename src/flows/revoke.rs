//! Refresh-token revocation.

// self
use crate::{
	_prelude::*,
	codec::Params,
	error::ConfigError,
	flows::RoundsClient,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::Operation,
};

impl<C, M> RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Revokes `refresh_token` (and the access tokens minted from it).
	///
	/// Posts `client_id` and `token` to `{ID_PROVIDER_URL}/oauth2/revoke`. Failures are
	/// returned; whether to ignore them is the caller's decision.
	pub async fn revoke(&self, refresh_token: &str) -> Result<()> {
		const OPERATION: Operation = Operation::Revoke;

		self.observe(OPERATION, "revoke", async move {
			if refresh_token.is_empty() {
				return Err(ConfigError::MissingRefreshToken.into());
			}

			let params = Params::new()
				.with("client_id", self.config.client_id.as_ref())
				.with("token", refresh_token);

			self.post_form(OPERATION, &self.config.endpoints.revoke, &params).await?;

			Ok(())
		})
		.await
	}
}

//! Refresh-token grant.
//!
//! Refreshing never mutates the input: it returns a new [`TokenSet`] that keeps the previous
//! refresh token whenever the provider omits one (Cognito never rotates refresh tokens).

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenSet},
	codec::Params,
	error::ConfigError,
	flows::RoundsClient,
	http::TokenHttpClient,
	oauth::{self, TokenResponse, TransportErrorMapper},
	obs::Operation,
};

impl<C, M> RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Refreshes `current`, carrying its refresh token forward when none is returned.
	///
	/// Fails with [`ConfigError::MissingRefreshToken`] without contacting the provider when
	/// `current` holds no refresh token.
	pub async fn refresh(&self, current: &TokenSet) -> Result<TokenSet> {
		let refresh_token =
			current.refresh_token.as_ref().ok_or(ConfigError::MissingRefreshToken)?;

		self.refresh_token(refresh_token.expose()).await
	}

	/// Performs `grant_type=refresh_token` for a raw refresh token.
	///
	/// The returned set always carries a refresh token: the rotated one when the provider
	/// sends it, `refresh_token` otherwise.
	pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet> {
		const OPERATION: Operation = Operation::Refresh;

		self.observe(OPERATION, "refresh_token", async move {
			if refresh_token.is_empty() {
				return Err(ConfigError::MissingRefreshToken.into());
			}

			let params = Params::new()
				.with("grant_type", "refresh_token")
				.with("client_id", self.config.client_id.as_ref())
				.with("refresh_token", refresh_token)
				.with_opt("client_secret", self.client_secret());
			let response = self.post_form(OPERATION, &self.config.endpoints.token, &params).await?;
			let issued_at = OffsetDateTime::now_utc();
			let body = oauth::parse_json::<TokenResponse>(OPERATION, response.body())?;
			let previous = TokenSecret::new(refresh_token);

			Ok(body.into_token_set(issued_at)?.carry_forward_refresh(Some(&previous)))
		})
		.await
	}
}

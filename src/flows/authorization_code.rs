//! Authorization Code grant: hosted sign-in URL and the code-for-tokens exchange.

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	codec::{self, Params, QueryOptions},
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
	/// Builds the hosted sign-in URL the user agent should be redirected to.
	///
	/// `{ID_PROVIDER_URL}/login?client_id&redirect_uri&response_type=code&scope[&client_secret]`,
	/// with scopes joined by a literal `+` so the provider decodes them as spaces. The redirect
	/// URI and client secret are component-encoded up front; the rest of the query is emitted
	/// verbatim.
	pub fn sign_in_url(&self) -> Url {
		let config = &self.config;
		let params = Params::new()
			.with("client_id", config.client_id.as_ref())
			.with("redirect_uri", urlencoding::encode(&config.redirect_uri).into_owned())
			.with("response_type", "code")
			.with("scope", config.scopes.joined('+'))
			.with_opt(
				"client_secret",
				self.client_secret().map(|secret| urlencoding::encode(secret).into_owned()),
			);
		let mut url = config.endpoints.login.clone();

		url.set_query(Some(&codec::encode_query(&params, QueryOptions::RAW)));

		url
	}

	/// Exchanges a single-use authorization code for a [`TokenSet`].
	///
	/// Sends `grant_type=authorization_code`, `client_id`, `code`, `redirect_uri`, and the
	/// optional `client_secret` to `{ID_PROVIDER_URL}/oauth2/token`. Any non-2xx status is an
	/// [`Error::Auth`]; the code must not be retried after a failure.
	pub async fn exchange_authorization_code(&self, code: &str) -> Result<TokenSet> {
		const OPERATION: Operation = Operation::ExchangeAuthorizationCode;

		self.observe(OPERATION, "exchange_authorization_code", async move {
			if code.trim().is_empty() {
				return Err(ConfigError::InvalidSetting {
					name: "code",
					reason: "authorization code is empty".into(),
				}
				.into());
			}

			let params = Params::new()
				.with("grant_type", "authorization_code")
				.with("client_id", self.config.client_id.as_ref())
				.with("code", code)
				.with("redirect_uri", self.config.redirect_uri.as_str())
				.with_opt("client_secret", self.client_secret());
			let response = self.post_form(OPERATION, &self.config.endpoints.token, &params).await?;
			let issued_at = OffsetDateTime::now_utc();
			let body = oauth::parse_json::<TokenResponse>(OPERATION, response.body())?;

			Ok(body.into_token_set(issued_at)?)
		})
		.await
	}
}

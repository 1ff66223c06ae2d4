//! Bearer-authenticated calls against the protected API.

// self
use crate::{
	_prelude::*,
	api::{self, RoundsPage, RoundsQuery},
	auth::UserId,
	codec::{self, Params, QueryOptions},
	flows::RoundsClient,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::Operation,
};

impl<C, M> RoundsClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// GETs `{API_URL}/{path}?{params}` with `Authorization: Bearer {access_token}` and decodes
	/// the JSON body.
	///
	/// 401/403 map to [`Error::Auth`], 404 to [`Error::NotFound`], any other non-2xx to
	/// [`Error::Api`], and an undecodable success body to a decode error.
	pub async fn fetch_protected_resource<T>(
		&self,
		path: &str,
		access_token: &str,
		params: &Params,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const OPERATION: Operation = Operation::FetchResource;

		self.observe(OPERATION, "fetch_protected_resource", async move {
			let mut url = self.config.api_endpoint(path)?;
			let query = codec::encode_query(params, QueryOptions::default());

			if !query.is_empty() {
				url.set_query(Some(&query));
			}

			let request = oauth::bearer_request(&url, access_token)?;
			let response = self.dispatch(OPERATION, request).await?;

			oauth::ensure_resource_success(&url, &response)?;

			Ok(oauth::parse_json(OPERATION, response.body())?)
		})
		.await
	}

	/// Lists the rounds of `user_id` (`GET /protected/v1/users/{user_id}/rounds`).
	pub async fn fetch_rounds(
		&self,
		user_id: &UserId,
		access_token: &str,
		query: RoundsQuery,
	) -> Result<RoundsPage> {
		self.fetch_protected_resource(&api::rounds_path(user_id), access_token, &query.to_params())
			.await
	}
}

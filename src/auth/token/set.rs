//! Token sets returned by the authorization-code and refresh grants.

// self
use crate::{
	_prelude::*,
	auth::{IdentityClaims, TokenSecret},
	error::DecodeError,
};

/// Tokens issued by one successful exchange or refresh.
///
/// Token sets are immutable; a refresh produces a new set. Expiry metadata is informational
/// and never triggers a refresh on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSet {
	/// Bearer token for the protected API.
	pub access_token: TokenSecret,
	/// OpenID Connect ID token carrying the identity claims.
	pub id_token: Option<TokenSecret>,
	/// Refresh token, when the provider issued or previously issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (usually `Bearer`).
	pub token_type: Option<String>,
	/// Local instant at which the response was received.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when reported.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenSet {
	/// Creates a set holding only an access token, issued now.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			id_token: None,
			refresh_token: None,
			token_type: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	/// Sets the ID token.
	pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
		self.id_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Overrides the issued-at instant, shifting any expiry with it.
	///
	/// The expiry is dropped when the shifted instant is out of range.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		if let Some(expires_at) = self.expires_at {
			self.expires_at = instant.checked_add(expires_at - self.issued_at);
		}

		self.issued_at = instant;

		self
	}

	/// Derives the expiry from a relative lifetime; out-of-range lifetimes clear it.
	pub fn with_expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(lifetime);

		self
	}

	/// Keeps `previous` as the refresh token when this set did not receive a new one.
	pub fn carry_forward_refresh(mut self, previous: Option<&TokenSecret>) -> Self {
		if self.refresh_token.is_none() {
			self.refresh_token = previous.cloned();
		}

		self
	}

	/// Decodes the identity claims from the ID token, if present.
	pub fn identity(&self) -> Result<Option<IdentityClaims>, DecodeError> {
		self.id_token
			.as_ref()
			.map(|token| IdentityClaims::from_id_token(token.expose()))
			.transpose()
	}

	/// Returns true when the reported lifetime has elapsed at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}

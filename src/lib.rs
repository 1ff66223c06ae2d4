//! OAuth 2.0 authorization-code client for a hosted identity provider, paired with a bearer
//! client for the protected rounds API and a small session orchestrator that sequences the
//! exchange, refresh, revoke, and resource-fetch calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod session;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		config::ClientConfig,
		flows::RoundsClient,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = RoundsClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Client identifier used by the test configuration.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Redirect URI used by the test configuration.
	pub const TEST_REDIRECT_URI: &str = "http://localhost:8080/";

	/// Builds a configuration whose identity provider and API both point at `base_url`
	/// (typically an `httpmock` server).
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.id_provider_url(base_url)
			.api_url(base_url)
			.client_id(TEST_CLIENT_ID)
			.redirect_uri(TEST_REDIRECT_URI)
			.request_timeout(StdDuration::from_secs(5))
			.build()
			.expect("Failed to build test client configuration.")
	}

	/// Constructs a [`RoundsClient`] backed by the default reqwest transport.
	pub fn build_reqwest_test_client(config: ClientConfig) -> ReqwestTestClient {
		RoundsClient::new(config).expect("Failed to build reqwest test client.")
	}

	/// Encodes `claims` as an unsigned compact token (`header.payload.signature`).
	pub fn compact_token(claims: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(
			serde_json::to_vec(claims).expect("Failed to serialize test claims."),
		);

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;

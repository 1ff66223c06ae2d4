#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_rounds::{_preludet::*, error::ConfigError, obs::Operation};

#[tokio::test]
async fn revoke_posts_client_id_and_token() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(test_config(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/revoke")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("token", "refresh-to-revoke");
			then.status(200);
		})
		.await;

	client.revoke("refresh-to-revoke").await.expect("Revocation should succeed.");

	mock.assert_async().await;

	assert_eq!(client.metrics().of(Operation::Revoke).successes(), 1);
}

#[tokio::test]
async fn revoke_failure_is_returned_to_caller() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(test_config(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/revoke");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"unsupported_token_type"}"#);
		})
		.await;
	let err = client
		.revoke("refresh-to-revoke")
		.await
		.expect_err("Rejected revocations should be surfaced.");

	mock.assert_calls_async(1).await;

	match err {
		Error::Auth { operation: Operation::Revoke, status: 400, body } => {
			assert_eq!(body.oauth_error(), Some("unsupported_token_type"));
		},
		other => panic!("Expected a revoke auth error, got {other:?}."),
	}
}

#[tokio::test]
async fn revoke_requires_a_token() {
	let client = build_reqwest_test_client(test_config("http://127.0.0.1:9"));
	let err = client.revoke("").await.expect_err("Empty tokens should be rejected locally.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
}

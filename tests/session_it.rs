#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use oauth2_rounds::{
	_preludet::*,
	api::RoundsQuery,
	error::DecodeError,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	session::{RevokeOutcome, Session, SessionAction, SessionPhase},
};

type TestSession = Session<ReqwestHttpClient, ReqwestTransportErrorMapper>;

const ROUNDS_PATH: &str = "/protected/v1/users/12345/rounds";

fn token_body(refresh_token: Option<&str>) -> Value {
	let mut body = json!({
		"access_token": "access-session-1",
		"id_token": compact_token(&json!({
			"sub": "sub-1",
			"custom:arccosUserId": "12345",
			"email": "player@example.com",
		})),
		"token_type": "Bearer",
		"expires_in": 3600,
	});

	if let Some(token) = refresh_token {
		body["refresh_token"] = json!(token);
	}

	body
}

fn rounds_body() -> Value {
	json!({
		"results": [{
			"roundId": 1,
			"userId": "12345",
			"startDate": "2024-06-01T10:00:00",
			"courseId": 5,
			"courseVersion": 1,
			"numberOfHoles": 18,
		}],
		"paging": { "limit": 1, "offset": 0 },
	})
}

fn build_session(server: &MockServer) -> TestSession {
	Session::new(build_reqwest_test_client(test_config(&server.base_url())))
}

#[tokio::test]
async fn observed_code_drives_session_to_ready() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "code-1");
			then.status(200).json_body(token_body(Some("refresh-1")));
		})
		.await;
	let rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH).header("authorization", "Bearer access-session-1");
			then.status(200).json_body(rounds_body());
		})
		.await;
	let session = build_session(&server);

	assert_eq!(session.phase(), SessionPhase::Unauthenticated);
	assert_eq!(session.tick().await.expect("Idle tick should succeed."), None);
	assert!(session.observe_code("code-1"));

	let actions = session.run_until_idle().await.expect("Session should reach Ready.");

	assert_eq!(actions, vec![SessionAction::Exchanged, SessionAction::FetchedRounds]);
	assert_eq!(session.phase(), SessionPhase::Ready);

	token.assert_calls_async(1).await;
	rounds.assert_calls_async(1).await;

	let snapshot = session.snapshot();

	assert!(snapshot.has_code);
	assert!(snapshot.has_refresh_token);
	assert_eq!(snapshot.access_token_preview.as_deref(), Some("acces...ion-1"));
	assert_eq!(
		snapshot.identity.as_ref().map(|claims| claims.user_id.as_ref()),
		Some("12345")
	);
	assert_eq!(snapshot.rounds.map(|page| page.results.len()), Some(1));
	assert_eq!(snapshot.last_error, None);

	// Re-observing the consumed code must not trigger another exchange.
	assert!(!session.observe_code("code-1"));
	assert_eq!(session.tick().await.expect("Idle tick should succeed."), None);

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_ticks_exchange_once() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).delay(StdDuration::from_millis(200)).json_body(token_body(None));
		})
		.await;
	let session = build_session(&server);

	session.observe_code("code-1");

	let (first, second) = tokio::join!(session.tick(), session.tick());
	let mut actions = [
		first.expect("First tick should succeed."),
		second.expect("Second tick should succeed."),
	];

	actions.sort_by_key(Option::is_none);

	assert_eq!(actions, [Some(SessionAction::Exchanged), None]);

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_exchange_is_not_retried() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400).json_body(json!({ "error": "invalid_grant" }));
		})
		.await;
	let session = build_session(&server);

	session.observe_code("stale-code");

	let err = session.tick().await.expect_err("Rejected exchange should be surfaced.");

	assert!(matches!(err, Error::Auth { status: 400, .. }), "Unexpected error: {err:?}.");
	assert_eq!(session.phase(), SessionPhase::Errored);
	assert!(session.snapshot().last_error.is_some_and(|message| message.contains("invalid_grant")));
	assert_eq!(session.tick().await.expect("Errored session should idle."), None);

	token.assert_calls_async(1).await;

	session.reset();

	assert_eq!(session.phase(), SessionPhase::Unauthenticated);
	assert!(!session.snapshot().has_code);
	assert!(session.observe_code("stale-code"), "Reset should forget the consumed code.");
}

#[tokio::test]
async fn undecodable_id_token_keeps_tokens_without_identity() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).json_body(json!({
				"access_token": "access-session-1",
				"id_token": "not-a-compact-token",
			}));
		})
		.await;
	let rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).json_body(rounds_body());
		})
		.await;
	let session = build_session(&server);

	session.observe_code("code-1");

	let err = session.tick().await.expect_err("Undecodable ID tokens should be reported.");

	assert!(
		matches!(err, Error::Decode(DecodeError::MalformedToken { segments: 1 })),
		"Unexpected error: {err:?}."
	);
	assert_eq!(session.phase(), SessionPhase::Authenticated);
	assert!(session.tokens().is_some());
	assert!(session.snapshot().identity.is_none());
	assert_eq!(session.tick().await.expect("Session without identity should idle."), None);
	assert!(matches!(
		session.fetch_rounds(RoundsQuery::default()).await,
		Err(Error::NotSignedIn)
	));

	rounds.assert_calls_async(0).await;
}

#[tokio::test]
async fn refresh_keeps_identity_and_skips_refetch() {
	let server = MockServer::start_async().await;
	let mut exchange = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "authorization_code");
			then.status(200).json_body(token_body(Some("refresh-1")));
		})
		.await;
	let rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).json_body(rounds_body());
		})
		.await;
	let session = build_session(&server);

	assert!(matches!(session.refresh().await, Err(Error::NotSignedIn)));

	session.observe_code("code-1");
	session.run_until_idle().await.expect("Session should reach Ready.");
	exchange.delete_async().await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-1");
			then.status(200).json_body(json!({
				"access_token": "access-session-2",
				"expires_in": 3600,
			}));
		})
		.await;
	let refreshed = session
		.refresh()
		.await
		.expect("Refresh should succeed.")
		.expect("No other refresh should be in flight.");

	refresh.assert_calls_async(1).await;

	assert_eq!(refreshed.access_token.expose(), "access-session-2");
	assert_eq!(refreshed.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-1"));
	assert_eq!(
		session.tokens().map(|tokens| tokens.access_token.expose().to_owned()),
		Some("access-session-2".into())
	);
	assert_eq!(
		session.snapshot().identity.map(|claims| claims.user_id.to_string()),
		Some("12345".into())
	);
	assert_eq!(session.phase(), SessionPhase::Ready);
	assert_eq!(session.tick().await.expect("Ready session should idle."), None);

	rounds.assert_calls_async(1).await;

	let page = session
		.fetch_rounds(RoundsQuery::default().limit(1))
		.await
		.expect("On-demand fetch should succeed.")
		.expect("No other fetch should be in flight.");

	assert_eq!(page.results[0].round_id, 1);

	rounds.assert_calls_async(2).await;
}

#[tokio::test]
async fn on_demand_fetch_satisfies_automatic_fetch() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).json_body(token_body(Some("refresh-1")));
		})
		.await;
	let rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).json_body(rounds_body());
		})
		.await;
	let session = build_session(&server);

	session.observe_code("code-1");

	assert_eq!(
		session.tick().await.expect("Exchange should succeed."),
		Some(SessionAction::Exchanged)
	);

	let page = session
		.fetch_rounds(RoundsQuery::default())
		.await
		.expect("On-demand fetch should succeed.")
		.expect("No other fetch should be in flight.");

	assert_eq!(page.results.len(), 1);
	assert_eq!(session.phase(), SessionPhase::Ready);
	assert_eq!(session.tick().await.expect("Ready session should idle."), None);

	rounds.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_with_undecodable_id_token_still_installs_tokens() {
	let server = MockServer::start_async().await;
	let mut exchange = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "authorization_code");
			then.status(200).json_body(token_body(Some("refresh-1")));
		})
		.await;
	let _rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).json_body(rounds_body());
		})
		.await;
	let session = build_session(&server);

	session.observe_code("code-1");
	session.run_until_idle().await.expect("Session should reach Ready.");
	exchange.delete_async().await;

	let _refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200).json_body(json!({
				"access_token": "access-session-2",
				"id_token": "garbage",
			}));
		})
		.await;
	let err = session.refresh().await.expect_err("Undecodable ID tokens should be reported.");

	assert!(
		matches!(err, Error::Decode(DecodeError::MalformedToken { segments: 1 })),
		"Unexpected error: {err:?}."
	);
	assert_eq!(
		session.tokens().map(|tokens| tokens.access_token.expose().to_owned()),
		Some("access-session-2".into())
	);
	assert_eq!(
		session.tokens().and_then(|tokens| {
			tokens.refresh_token.as_ref().map(|secret| secret.expose().to_owned())
		}),
		Some("refresh-1".into())
	);

	let snapshot = session.snapshot();

	assert_eq!(snapshot.identity.map(|claims| claims.user_id.to_string()), Some("12345".into()));
	assert!(snapshot.rounds.is_some());
	assert!(snapshot.last_error.is_some());
	assert_eq!(session.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn revoke_cancels_in_flight_fetch() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).json_body(token_body(Some("refresh-1")));
		})
		.await;
	let _rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).delay(StdDuration::from_secs(2)).json_body(rounds_body());
		})
		.await;
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/revoke")
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("token", "refresh-1");
			then.status(200);
		})
		.await;
	let session = build_session(&server);

	session.observe_code("code-1");

	assert_eq!(
		session.tick().await.expect("Exchange should succeed."),
		Some(SessionAction::Exchanged)
	);

	let (fetch, outcome) = tokio::join!(session.tick(), async {
		tokio::time::sleep(StdDuration::from_millis(100)).await;

		assert_eq!(session.phase(), SessionPhase::FetchingResource);

		session.revoke().await
	});

	assert!(matches!(fetch, Err(Error::Cancelled)), "Unexpected fetch result: {fetch:?}.");
	assert!(outcome.is_revoked(), "Unexpected revoke outcome: {outcome:?}.");

	revoke.assert_calls_async(1).await;

	let snapshot = session.snapshot();

	assert_eq!(snapshot.phase, SessionPhase::Unauthenticated);
	assert!(snapshot.identity.is_none());
	assert!(snapshot.rounds.is_none());
	assert!(session.tokens().is_none());
	assert_eq!(session.tick().await.expect("Signed-out session should idle."), None);
}

#[tokio::test]
async fn revoke_skips_or_reports_failures_but_always_clears() {
	let server = MockServer::start_async().await;
	let mut token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).json_body(token_body(None));
		})
		.await;
	let _rounds = server
		.mock_async(|when, then| {
			when.method(GET).path(ROUNDS_PATH);
			then.status(200).json_body(rounds_body());
		})
		.await;
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/revoke");
			then.status(500).body("Internal Server Error");
		})
		.await;
	let session = build_session(&server);

	assert!(matches!(session.revoke().await, RevokeOutcome::Skipped));

	session.observe_code("code-1");
	session.run_until_idle().await.expect("Session should reach Ready.");

	assert!(matches!(session.revoke().await, RevokeOutcome::Skipped));
	assert_eq!(session.phase(), SessionPhase::Unauthenticated);

	revoke.assert_calls_async(0).await;
	token.delete_async().await;

	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).json_body(token_body(Some("refresh-2")));
		})
		.await;

	session.observe_code("code-2");
	session.run_until_idle().await.expect("Session should reach Ready again.");

	match session.revoke().await {
		RevokeOutcome::Failed(Error::Auth { status, .. }) => assert_eq!(status, 500),
		other => panic!("Expected a failed revocation, got {other:?}."),
	}

	revoke.assert_calls_async(1).await;

	assert_eq!(session.phase(), SessionPhase::Unauthenticated);
	assert!(session.tokens().is_none());
}

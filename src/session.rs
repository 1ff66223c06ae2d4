//! Session orchestrator sequencing the exchange, refresh, revoke, and rounds fetch.
//!
//! [`Session`] is the single writer of the current [`TokenSet`]. It holds its state behind a
//! `parking_lot` mutex that is never held across an `.await`: each step locks, decides what to
//! do, marks the request in flight, releases the lock, awaits the client, and re-locks to apply
//! the result. Every request is raced against the session's cancellation token; `revoke` and
//! `reset` cancel that token and open a new epoch, so results that arrive late are dropped.

mod state;

// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	api::{RoundsPage, RoundsQuery},
	auth::{IdentityClaims, TokenSet, UserId},
	flows::RoundsClient,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs,
};
use state::{Plan, SessionState, Ticket};

/// Externally visible session phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
	/// No tokens and no exchange in progress.
	Unauthenticated,
	/// Authorization code exchange in flight.
	Exchanging,
	/// Tokens held; rounds not loaded yet.
	Authenticated,
	/// Rounds fetch in flight.
	FetchingResource,
	/// Tokens and rounds held.
	Ready,
	/// The code exchange failed; a new code (or a reset) is required.
	Errored,
}
impl SessionPhase {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionPhase::Unauthenticated => "unauthenticated",
			SessionPhase::Exchanging => "exchanging",
			SessionPhase::Authenticated => "authenticated",
			SessionPhase::FetchingResource => "fetching_resource",
			SessionPhase::Ready => "ready",
			SessionPhase::Errored => "errored",
		}
	}
}
impl Display for SessionPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Step performed by [`Session::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAction {
	/// The observed authorization code was exchanged for tokens.
	Exchanged,
	/// Rounds were fetched for the current identity.
	FetchedRounds,
}

/// Result of [`Session::revoke`]. Local state is cleared in every case.
#[derive(Debug)]
pub enum RevokeOutcome {
	/// The provider accepted the revocation.
	Revoked,
	/// No refresh token was held, so nothing was sent.
	Skipped,
	/// The revocation call failed; the failure has already been logged.
	Failed(Error),
}
impl RevokeOutcome {
	/// Returns true when the provider confirmed the revocation.
	pub fn is_revoked(&self) -> bool {
		matches!(self, Self::Revoked)
	}
}

/// Read-only view of the session, safe to render.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
	/// Current phase.
	pub phase: SessionPhase,
	/// Whether an authorization code has been observed.
	pub has_code: bool,
	/// Unverified identity claims from the ID token.
	pub identity: Option<IdentityClaims>,
	/// Most recently loaded rounds.
	pub rounds: Option<RoundsPage>,
	/// Abbreviated access token (first and last five characters).
	pub access_token_preview: Option<String>,
	/// Whether a refresh token is held.
	pub has_refresh_token: bool,
	/// Message of the most recent failure, cleared by the next success.
	pub last_error: Option<String>,
}

/// Orchestrates a single signed-in session on top of a [`RoundsClient`].
pub struct Session<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: Arc<RoundsClient<C, M>>,
	state: Mutex<SessionState>,
}
impl<C, M> Session<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an unauthenticated session.
	pub fn new(client: impl Into<Arc<RoundsClient<C, M>>>) -> Self {
		Self { client: client.into(), state: Mutex::new(SessionState::default()) }
	}

	/// Underlying client.
	pub fn client(&self) -> &RoundsClient<C, M> {
		&self.client
	}

	/// Current phase.
	pub fn phase(&self) -> SessionPhase {
		self.state.lock().phase()
	}

	/// Current token set, if signed in.
	pub fn tokens(&self) -> Option<TokenSet> {
		self.state.lock().tokens.clone()
	}

	/// Read-only view for rendering.
	pub fn snapshot(&self) -> SessionSnapshot {
		let state = self.state.lock();

		SessionSnapshot {
			phase: state.phase(),
			has_code: state.code.is_some(),
			identity: state.identity.clone(),
			rounds: state.rounds.clone(),
			access_token_preview: state.tokens.as_ref().map(|t| t.access_token.preview()),
			has_refresh_token: state.tokens.as_ref().is_some_and(|t| t.refresh_token.is_some()),
			last_error: state.last_error.clone(),
		}
	}

	/// Records an authorization code delivered by the redirect.
	///
	/// Observing the same code again is a no-op; a different code re-arms the exchange.
	/// Returns true when the exchange was re-armed.
	pub fn observe_code(&self, code: &str) -> bool {
		self.state.lock().observe_code(code)
	}

	/// Performs at most one automatic step.
	///
	/// Exchanges the observed code when it is unused and has not failed; otherwise fetches
	/// rounds once for the current identity; otherwise does nothing and returns `Ok(None)`.
	/// Concurrent calls never start the same request twice.
	pub async fn tick(&self) -> Result<Option<SessionAction>> {
		let plan = self.state.lock().plan();

		match plan {
			None => Ok(None),
			Some(Plan::Exchange { code, ticket }) => {
				let result =
					cancellable(&ticket.cancel, self.client.exchange_authorization_code(&code))
						.await;

				self.finish_exchange(&ticket, result).map(|()| Some(SessionAction::Exchanged))
			},
			Some(Plan::Fetch { user_id, access_token, query, ticket }) => {
				let result = cancellable(
					&ticket.cancel,
					self.client.fetch_rounds(&user_id, &access_token, query),
				)
				.await;

				self.finish_fetch(&ticket, &user_id, result)
					.map(|_| Some(SessionAction::FetchedRounds))
			},
		}
	}

	/// Calls [`tick`](Self::tick) until it reports no work, returning the steps taken.
	pub async fn run_until_idle(&self) -> Result<Vec<SessionAction>> {
		let mut actions = Vec::new();

		while let Some(action) = self.tick().await? {
			actions.push(action);
		}

		Ok(actions)
	}

	/// Replaces the token set with a refreshed one.
	///
	/// Returns `Ok(None)` when a refresh is already in flight. The automatic rounds fetch is
	/// re-armed only when the refreshed ID token names a different user. An undecodable ID
	/// token is reported as an error after the refreshed tokens are installed.
	pub async fn refresh(&self) -> Result<Option<TokenSet>> {
		let (current, ticket) = {
			let mut state = self.state.lock();

			if state.in_flight.refresh {
				return Ok(None);
			}
			if state.in_flight.exchange {
				return Err(Error::NotSignedIn);
			}

			let current = state.tokens.clone().ok_or(Error::NotSignedIn)?;

			state.in_flight.refresh = true;

			(current, state.ticket())
		};
		let result = cancellable(&ticket.cancel, self.client.refresh(&current)).await;
		let mut state = self.state.lock();

		if !state.is_current(&ticket) {
			return Err(Error::Cancelled);
		}

		state.in_flight.refresh = false;

		let outcome = match result {
			Ok(tokens) => {
				// Refresh responses may omit the ID token or carry an undecodable one. Either
				// way the refreshed tokens are installed and the known identity is kept.
				let (identity, outcome) = match tokens.identity() {
					Ok(identity) => (identity, Ok(Some(tokens.clone()))),
					Err(e) => (None, Err(e.into())),
				};
				let identity = identity.or_else(|| state.identity.clone());

				state.install_tokens(tokens, identity);

				if outcome.is_ok() {
					state.last_error = None;
				}

				outcome
			},
			Err(e) => Err(e),
		};

		if let Err(e) = &outcome {
			state.record_error(e);
		}

		state.sync_phase();

		outcome
	}

	/// Fetches rounds on demand for the current identity.
	///
	/// Returns `Ok(None)` when a fetch is already in flight.
	pub async fn fetch_rounds(&self, query: RoundsQuery) -> Result<Option<RoundsPage>> {
		let (user_id, access_token, ticket) = {
			let mut state = self.state.lock();

			if state.in_flight.fetch {
				return Ok(None);
			}
			if state.in_flight.exchange {
				return Err(Error::NotSignedIn);
			}

			let tokens = state.tokens.as_ref().ok_or(Error::NotSignedIn)?;
			let identity = state.identity.as_ref().ok_or(Error::NotSignedIn)?;
			let user_id = identity.user_id.clone();
			let access_token = tokens.access_token.expose().to_owned();

			state.begin_fetch(&user_id);

			(user_id, access_token, state.ticket())
		};
		let result =
			cancellable(&ticket.cancel, self.client.fetch_rounds(&user_id, &access_token, query))
				.await;

		self.finish_fetch(&ticket, &user_id, result).map(Some)
	}

	/// Signs out: clears local state and cancels in-flight requests, then revokes the refresh
	/// token.
	///
	/// Teardown never waits on the provider. A failed revocation is logged and returned as
	/// [`RevokeOutcome::Failed`].
	pub async fn revoke(&self) -> RevokeOutcome {
		let refresh_token = {
			let mut state = self.state.lock();
			let refresh_token = state
				.tokens
				.as_ref()
				.and_then(|tokens| tokens.refresh_token.as_ref())
				.map(|secret| secret.expose().to_owned());

			state.clear(false);

			refresh_token
		};
		let Some(refresh_token) = refresh_token else {
			return RevokeOutcome::Skipped;
		};

		match self.client.revoke(&refresh_token).await {
			Ok(()) => RevokeOutcome::Revoked,
			Err(e) => {
				obs::report_revoke_failure(&e);

				RevokeOutcome::Failed(e)
			},
		}
	}

	/// Drops everything, including the observed code, and cancels in-flight requests.
	pub fn reset(&self) {
		self.state.lock().clear(true);
	}

	fn finish_exchange(&self, ticket: &Ticket, result: Result<TokenSet>) -> Result<()> {
		let mut state = self.state.lock();

		if !state.is_current(ticket) {
			return Err(Error::Cancelled);
		}

		state.in_flight.exchange = false;

		let outcome = match result {
			Ok(tokens) => {
				// Undecodable ID tokens still sign the session in, without an identity.
				let (identity, outcome) = match tokens.identity() {
					Ok(identity) => (identity, Ok(())),
					Err(e) => (None, Err(e.into())),
				};

				state.install_tokens(tokens, identity);
				state.fetched_for = None;

				outcome
			},
			Err(e) => {
				state.exchange_failed = true;

				Err(e)
			},
		};

		match &outcome {
			Ok(()) => state.last_error = None,
			Err(e) => state.record_error(e),
		}

		state.sync_phase();

		outcome
	}

	fn finish_fetch(
		&self,
		ticket: &Ticket,
		user_id: &UserId,
		result: Result<RoundsPage>,
	) -> Result<RoundsPage> {
		let mut state = self.state.lock();

		if !state.is_current(ticket) {
			return Err(Error::Cancelled);
		}

		state.in_flight.fetch = false;

		let current_user = state.identity.as_ref().map(|claims| &claims.user_id);
		let outcome = if current_user != Some(user_id) {
			// Identity changed while the request was in flight.
			Err(Error::Cancelled)
		} else {
			match result {
				Ok(page) => {
					state.rounds = Some(page.clone());
					state.last_error = None;

					Ok(page)
				},
				Err(e) => {
					state.record_error(&e);

					Err(e)
				},
			}
		};

		state.sync_phase();

		outcome
	}
}
impl<C, M> Debug for Session<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session").field("phase", &self.phase()).finish()
	}
}

async fn cancellable<T>(
	cancel: &CancellationToken,
	fut: impl Future<Output = Result<T>>,
) -> Result<T> {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		result = fut => result,
	}
}

//! Mutable session state guarded by the orchestrator's mutex.
//!
//! Everything here is synchronous: callers lock, decide, release, and only then await.

// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	api::{RoundsPage, RoundsQuery},
	auth::{IdentityClaims, TokenSet, UserId},
	obs,
	session::SessionPhase,
};

/// Flags for requests currently awaiting a response.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct InFlight {
	pub(crate) exchange: bool,
	pub(crate) refresh: bool,
	pub(crate) fetch: bool,
}

/// Work chosen by [`SessionState::plan`]; the corresponding in-flight flag is already set.
#[derive(Debug)]
pub(crate) enum Plan {
	Exchange { code: String, ticket: Ticket },
	Fetch { user_id: UserId, access_token: String, query: RoundsQuery, ticket: Ticket },
}

/// Epoch and cancellation handle captured when a request starts.
#[derive(Clone, Debug)]
pub(crate) struct Ticket {
	pub(crate) epoch: u64,
	pub(crate) cancel: CancellationToken,
}

#[derive(Debug)]
pub(crate) struct SessionState {
	pub(crate) code: Option<String>,
	pub(crate) code_attempted: bool,
	pub(crate) exchange_failed: bool,
	pub(crate) tokens: Option<TokenSet>,
	pub(crate) identity: Option<IdentityClaims>,
	pub(crate) rounds: Option<RoundsPage>,
	// Identity the automatic fetch already ran (or is running) for.
	pub(crate) fetched_for: Option<UserId>,
	pub(crate) last_error: Option<String>,
	pub(crate) in_flight: InFlight,
	pub(crate) epoch: u64,
	pub(crate) cancel: CancellationToken,
	phase: SessionPhase,
}
impl Default for SessionState {
	fn default() -> Self {
		Self {
			code: None,
			code_attempted: false,
			exchange_failed: false,
			tokens: None,
			identity: None,
			rounds: None,
			fetched_for: None,
			last_error: None,
			in_flight: InFlight::default(),
			epoch: 0,
			cancel: CancellationToken::new(),
			phase: SessionPhase::Unauthenticated,
		}
	}
}
impl SessionState {
	pub(crate) fn phase(&self) -> SessionPhase {
		self.phase
	}

	pub(crate) fn ticket(&self) -> Ticket {
		Ticket { epoch: self.epoch, cancel: self.cancel.clone() }
	}

	pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
		self.epoch == ticket.epoch
	}

	/// Records `code`; returns true when it re-arms the exchange.
	pub(crate) fn observe_code(&mut self, code: &str) -> bool {
		let code = code.trim();

		if code.is_empty() || self.code.as_deref() == Some(code) {
			return false;
		}

		self.code = Some(code.to_owned());
		self.code_attempted = false;
		self.exchange_failed = false;
		self.last_error = None;
		self.sync_phase();

		true
	}

	/// Picks the next automatic step and marks it in flight.
	pub(crate) fn plan(&mut self) -> Option<Plan> {
		if self.in_flight.exchange {
			return None;
		}
		if let Some(code) = self.code.as_ref().filter(|_| !self.code_attempted)
			&& !self.exchange_failed
		{
			let code = code.clone();

			self.code_attempted = true;
			self.in_flight.exchange = true;
			self.sync_phase();

			return Some(Plan::Exchange { code, ticket: self.ticket() });
		}
		if self.in_flight.fetch || self.in_flight.refresh {
			return None;
		}

		let (tokens, identity) = (self.tokens.as_ref()?, self.identity.as_ref()?);

		if self.fetched_for.as_ref() == Some(&identity.user_id) {
			return None;
		}

		let user_id = identity.user_id.clone();
		let access_token = tokens.access_token.expose().to_owned();

		self.begin_fetch(&user_id);

		Some(Plan::Fetch {
			user_id,
			access_token,
			query: RoundsQuery::default(),
			ticket: self.ticket(),
		})
	}

	/// Marks a rounds fetch for `user_id` in flight; the automatic fetch then stays satisfied
	/// for that identity.
	pub(crate) fn begin_fetch(&mut self, user_id: &UserId) {
		self.fetched_for = Some(user_id.clone());
		self.in_flight.fetch = true;
		self.sync_phase();
	}

	/// Installs a freshly issued token set and its identity.
	pub(crate) fn install_tokens(&mut self, tokens: TokenSet, identity: Option<IdentityClaims>) {
		let changed = self.identity.as_ref().map(|claims| &claims.user_id)
			!= identity.as_ref().map(|claims| &claims.user_id);

		if changed {
			self.rounds = None;
		}

		self.tokens = Some(tokens);
		self.identity = identity;
	}

	pub(crate) fn record_error(&mut self, err: &Error) {
		self.last_error = Some(err.to_string());
	}

	/// Drops tokens, identity, and results; cancels in-flight requests and opens a new epoch.
	///
	/// The observed code survives unless `forget_code` is set, so a consumed code is never
	/// exchanged twice.
	pub(crate) fn clear(&mut self, forget_code: bool) {
		self.cancel.cancel();

		let epoch = self.epoch.wrapping_add(1);
		let (code, code_attempted) = if forget_code {
			(None, false)
		} else {
			(self.code.take(), self.code_attempted)
		};
		let phase = self.phase;

		*self = Self { code, code_attempted, epoch, phase, ..Self::default() };

		self.sync_phase();
	}

	/// Recomputes the phase and reports transitions.
	pub(crate) fn sync_phase(&mut self) {
		let next = self.derive_phase();

		obs::record_transition(self.phase, next);
		obs::record_phase_change(self.phase, next);

		self.phase = next;
	}

	fn derive_phase(&self) -> SessionPhase {
		if self.in_flight.exchange {
			SessionPhase::Exchanging
		} else if self.tokens.is_none() {
			if self.exchange_failed {
				SessionPhase::Errored
			} else {
				SessionPhase::Unauthenticated
			}
		} else if self.in_flight.fetch {
			SessionPhase::FetchingResource
		} else if self.rounds.is_some() {
			SessionPhase::Ready
		} else {
			SessionPhase::Authenticated
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity(user: &str) -> IdentityClaims {
		IdentityClaims {
			sub: format!("sub-{user}"),
			user_id: UserId::new(user).expect("User fixture should be valid."),
			email: None,
			extra: Default::default(),
		}
	}

	#[test]
	fn exchange_is_planned_once_per_code() {
		let mut state = SessionState::default();

		assert!(state.plan().is_none());
		assert!(state.observe_code("code-1"));
		assert!(!state.observe_code("code-1"), "Same code must not re-arm.");
		assert!(matches!(state.plan(), Some(Plan::Exchange { ref code, .. }) if code == "code-1"));
		assert_eq!(state.phase(), SessionPhase::Exchanging);
		assert!(state.plan().is_none(), "In-flight exchange must not be duplicated.");

		state.in_flight.exchange = false;
		state.exchange_failed = true;
		state.sync_phase();

		assert!(state.plan().is_none(), "Failed code must not be retried.");
		assert_eq!(state.phase(), SessionPhase::Errored);
		assert!(state.observe_code("code-2"));
		assert!(matches!(state.plan(), Some(Plan::Exchange { .. })));
	}

	#[test]
	fn fetch_is_planned_once_per_identity() {
		let mut state = SessionState::default();

		state.install_tokens(TokenSet::new("access"), Some(identity("1")));
		state.sync_phase();

		assert_eq!(state.phase(), SessionPhase::Authenticated);
		assert!(matches!(
			state.plan(),
			Some(Plan::Fetch { ref user_id, .. }) if user_id.as_ref() == "1"
		));
		assert_eq!(state.phase(), SessionPhase::FetchingResource);
		assert!(state.plan().is_none());

		state.in_flight.fetch = false;

		assert!(state.plan().is_none(), "Same identity must not be fetched twice.");

		state.install_tokens(TokenSet::new("access-2"), Some(identity("1")));

		assert!(state.plan().is_none(), "Unchanged identity must not re-arm the fetch.");

		state.install_tokens(TokenSet::new("access-3"), Some(identity("2")));

		assert!(matches!(state.plan(), Some(Plan::Fetch { .. })));
	}

	#[test]
	fn on_demand_fetch_satisfies_automatic_fetch() {
		let mut state = SessionState::default();
		let user = identity("1");

		state.install_tokens(TokenSet::new("access"), Some(user.clone()));
		state.begin_fetch(&user.user_id);

		assert_eq!(state.phase(), SessionPhase::FetchingResource);
		assert!(state.plan().is_none());

		state.in_flight.fetch = false;
		state.sync_phase();

		assert!(state.plan().is_none(), "Fetched identity must not be fetched again.");
	}

	#[test]
	fn fetch_requires_identity() {
		let mut state = SessionState::default();

		state.install_tokens(TokenSet::new("access"), None);

		assert!(state.plan().is_none());
	}

	#[test]
	fn clear_cancels_and_bumps_epoch() {
		let mut state = SessionState::default();

		state.observe_code("code");

		let ticket = match state.plan() {
			Some(Plan::Exchange { ticket, .. }) => ticket,
			other => panic!("Expected an exchange plan, got {other:?}."),
		};

		state.clear(false);

		assert!(ticket.cancel.is_cancelled());
		assert!(!state.is_current(&ticket));
		assert_eq!(state.code.as_deref(), Some("code"));
		assert!(state.plan().is_none(), "Consumed code must stay consumed.");
		assert_eq!(state.phase(), SessionPhase::Unauthenticated);

		state.clear(true);

		assert!(state.code.is_none());
		assert!(!state.cancel.is_cancelled());
	}
}

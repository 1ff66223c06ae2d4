//! Observability helpers for client operations and session transitions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `oauth2_rounds.operation` with the
//!   `operation` and `stage` fields, plus events for revoke failures and session transitions.
//! - Enable `metrics` to increment the `oauth2_rounds_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `oauth2_rounds_session_transition_total` counter for every session phase change, labeled
//!   by `from` + `to`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound calls issued by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	/// `grant_type=authorization_code` against the token endpoint.
	ExchangeAuthorizationCode,
	/// `grant_type=refresh_token` against the token endpoint.
	Refresh,
	/// Refresh-token revocation.
	Revoke,
	/// Bearer-authenticated protected API call.
	FetchResource,
}
impl Operation {
	/// Every operation, in counter-index order.
	pub const ALL: [Operation; 4] =
		[Self::ExchangeAuthorizationCode, Self::Refresh, Self::Revoke, Self::FetchResource];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::ExchangeAuthorizationCode => "exchange_authorization_code",
			Operation::Refresh => "refresh",
			Operation::Revoke => "revoke",
			Operation::FetchResource => "fetch_resource",
		}
	}

	pub(crate) const fn index(self) -> usize {
		match self {
			Operation::ExchangeAuthorizationCode => 0,
			Operation::Refresh => 1,
			Operation::Revoke => 2,
			Operation::FetchResource => 3,
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

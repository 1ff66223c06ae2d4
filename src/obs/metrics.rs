// self
use crate::{
	obs::{Operation, Outcome},
	session::SessionPhase,
};

/// Counter incremented for every client attempt, success, and failure.
pub const OPERATION_TOTAL: &str = "oauth2_rounds_operation_total";
/// Counter incremented whenever a session moves to a different phase.
pub const SESSION_TRANSITION_TOTAL: &str = "oauth2_rounds_session_transition_total";

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			OPERATION_TOTAL,
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Counts a session phase change, labeled by `from` and `to`. Re-entering the same phase is not
/// counted.
pub fn record_phase_change(from: SessionPhase, to: SessionPhase) {
	if from == to {
		return;
	}

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			SESSION_TRANSITION_TOTAL,
			"from" => from.as_str(),
			"to" => to.as_str()
		)
		.increment(1);
	}
}

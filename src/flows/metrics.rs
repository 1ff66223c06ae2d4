// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{Operation, Outcome};

/// Thread-safe counters for a single operation.
#[derive(Debug, Default)]
pub struct OperationCounters {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl OperationCounters {
	/// Returns the total number of attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful calls.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed calls.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	fn record(&self, outcome: Outcome) {
		let counter = match outcome {
			Outcome::Attempt => &self.attempts,
			Outcome::Success => &self.success,
			Outcome::Failure => &self.failure,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}

/// Counters for every [`Operation`], shared by a client and its clones.
#[derive(Debug, Default)]
pub struct OperationMetrics {
	counters: [OperationCounters; Operation::ALL.len()],
}
impl OperationMetrics {
	/// Returns the counters for `operation`.
	pub fn of(&self, operation: Operation) -> &OperationCounters {
		&self.counters[operation.index()]
	}

	/// Sum of attempts across every operation.
	pub fn total_attempts(&self) -> u64 {
		self.counters.iter().map(OperationCounters::attempts).sum()
	}

	pub(crate) fn record(&self, operation: Operation, outcome: Outcome) {
		self.of(operation).record(outcome);
	}
}

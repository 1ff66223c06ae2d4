// self
use crate::{_prelude::*, obs::Operation, session::SessionPhase};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_rounds.operation", operation = operation.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports a revocation failure that did not block local teardown.
pub fn report_revoke_failure(err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "Refresh token revocation failed; local session was cleared.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Records a session phase change.
pub fn record_transition(from: SessionPhase, to: SessionPhase) {
	#[cfg(feature = "tracing")]
	{
		if from != to {
			tracing::debug!(from = from.as_str(), to = to.as_str(), "Session phase changed.");
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (from, to);
	}
}

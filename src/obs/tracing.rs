// self
use crate::{
	_prelude::*,
	auth::{AuthFailure, ScopeSet},
	obs::Operation,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by the acquirer, the directory client, and the roster.
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
				tracing::info_span!("graph_roster.operation", operation = operation.as_str(), stage);

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

/// Emits a debug event for a cached token being reused.
pub fn log_cache_hit(scope: &ScopeSet, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(scope = %scope, %expires_at, "reusing cached token");
	#[cfg(not(feature = "tracing"))]
	let _ = (scope, expires_at);
}

/// Emits an info event before a token exchange.
pub fn log_cache_miss(scope: &ScopeSet, reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::info!(scope = %scope, reason, "no suitable token in cache");
	#[cfg(not(feature = "tracing"))]
	let _ = (scope, reason);
}

/// Emits a warning for a rejected token exchange.
pub fn log_auth_failure(failure: &AuthFailure) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		kind = failure.kind.as_str(),
		code = %failure.code,
		correlation_id = failure.correlation_id.as_deref().unwrap_or(""),
		status = failure.status,
		"token exchange rejected"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = failure;
}

/// Emits a debug event when a listing has more pages than were read.
pub fn log_truncated_listing(operation: Operation, returned: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		operation = operation.as_str(),
		returned,
		"listing has further pages; only the first was read"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, returned);
}

// self
use crate::obs::{CacheResult, Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"graph_roster_operation_total",
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

/// Records a token cache lookup result via the global metrics recorder (when enabled).
pub fn record_cache_result(result: CacheResult) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("graph_roster_token_cache_total", "result" => result.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = result;
	}
}

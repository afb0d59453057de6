//! Optional observability helpers for token acquisition and directory lookups.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `graph_roster.operation` with the
//!   `operation` and `stage` fields, plus events for cache hits, cache misses, and rejected
//!   token exchanges. Secrets are never recorded.
//! - Enable `metrics` to increment `graph_roster_operation_total` (labeled by `operation` +
//!   `outcome`) and `graph_roster_token_cache_total` (labeled by `result`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Token acquisition (cache probe and, if needed, exchange).
	AcquireToken,
	/// Group lookup by display-name prefix.
	ResolveGroup,
	/// Member listing for a resolved group.
	ListMembers,
	/// Group lookup followed by member listing and projection.
	ListGroupMembers,
	/// Token acquisition followed by the full directory query.
	GroupMembers,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::AcquireToken => "acquire_token",
			Operation::ResolveGroup => "resolve_group",
			Operation::ListMembers => "list_members",
			Operation::ListGroupMembers => "list_group_members",
			Operation::GroupMembers => "group_members",
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

	/// Maps a result onto [`Outcome::Success`] or [`Outcome::Failure`].
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { Outcome::Success } else { Outcome::Failure }
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of a token cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheResult {
	/// A usable cached token was returned.
	Hit,
	/// The cache had nothing usable; an exchange follows.
	Miss,
}
impl CacheResult {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheResult::Hit => "hit",
			CacheResult::Miss => "miss",
		}
	}
}
impl Display for CacheResult {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

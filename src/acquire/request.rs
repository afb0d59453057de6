//! Per-call acquisition parameters and the cache freshness policy.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
};

/// Why a cached record was not reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMiss {
	/// Nothing cached for the scope.
	Empty,
	/// The caller asked to bypass the cache.
	Forced,
	/// The cached token reached its expiry instant.
	Expired,
	/// The cached token expires inside the preemptive window.
	ExpiringSoon,
}
impl CacheMiss {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheMiss::Empty => "empty",
			CacheMiss::Forced => "forced",
			CacheMiss::Expired => "expired",
			CacheMiss::ExpiringSoon => "expiring_soon",
		}
	}
}

/// Parameters of one acquisition.
///
/// Cached records are reused unless `force` is set, the record expired, or it expires
/// within the preemptive window. The window is shortened by a jitter derived from the scope
/// so processes sharing a configuration do not all renew at the same second.
#[derive(Clone, Debug)]
pub struct AcquireRequest {
	/// Normalized scope set for the request.
	pub scope: ScopeSet,
	/// Forces cache bypass when true.
	pub force: bool,
	/// Jittered preemptive window used when renewing early.
	pub preemptive_window: Duration,
}
impl AcquireRequest {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a request for the provided scope.
	pub fn new(scope: ScopeSet) -> Self {
		Self { scope, force: false, preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}

	/// Forces the acquirer to bypass the cache.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the jittered preemptive window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Returns why `cached` cannot be reused at `now`, or `None` when it can.
	pub fn miss_reason(
		&self,
		cached: Option<&TokenRecord>,
		now: OffsetDateTime,
	) -> Option<CacheMiss> {
		let Some(record) = cached else {
			return Some(CacheMiss::Empty);
		};

		if self.force {
			return Some(CacheMiss::Forced);
		}
		if record.is_expired_at(now) {
			return Some(CacheMiss::Expired);
		}

		let effective_window = self.effective_preemptive_window();

		if !effective_window.is_zero() && record.expires_at - now <= effective_window {
			return Some(CacheMiss::ExpiringSoon);
		}

		None
	}

	/// Determines whether the cached record should be replaced.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		self.miss_reason(Some(record), now).is_some()
	}

	fn effective_preemptive_window(&self) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter()).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		// Jitter stays below a quarter of the window.
		let modulus = u64::try_from(window_secs / 4).unwrap_or(0);

		if modulus == 0 {
			return Duration::ZERO;
		}

		let jitter_secs = self.jitter_seed() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(0))
	}

	fn jitter_seed(&self) -> u64 {
		let mut hasher = DefaultHasher::new();

		self.scope.hash(&mut hasher);

		hasher.finish()
	}
}

//! Token acquisition with an in-process cache and singleflight guards.
//!
//! [`TokenAcquirer`] follows a fixed order for every call: take the per-scope guard, probe
//! the cache, reuse the record if [`AcquireRequest`] deems it fresh, otherwise exchange
//! credentials with the token endpoint. Concurrent callers for the same scope wait on the
//! guard and then find the freshly cached record instead of stampeding the endpoint.
//!
//! The backend is a seam: production code uses [`ConfidentialClient`]; tests substitute
//! any [`TokenBackend`] and count its calls.

pub mod confidential;
pub mod metrics;
pub mod request;

pub use confidential::*;
pub use metrics::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	config::Credentials,
	obs::{self, CacheResult, Operation, OperationSpan, Outcome},
};

/// Boxed future returned by [`TokenBackend`] operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// The two capabilities the acquirer needs from a credential provider.
pub trait TokenBackend
where
	Self: Send + Sync,
{
	/// Returns a cached record for `scope` without network I/O.
	fn probe_cached<'a>(&'a self, scope: &'a ScopeSet) -> BackendFuture<'a, Option<TokenRecord>>;

	/// Exchanges credentials for a new record and caches it.
	fn exchange<'a>(&'a self, scope: &'a ScopeSet) -> BackendFuture<'a, TokenRecord>;
}

type GuardMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Obtains bearer tokens for a fixed scope set.
pub struct TokenAcquirer<B = ConfidentialClient>
where
	B: ?Sized + TokenBackend,
{
	backend: Arc<B>,
	scope: ScopeSet,
	metrics: Arc<CacheMetrics>,
	guards: GuardMap,
}
impl<B> TokenAcquirer<B>
where
	B: ?Sized + TokenBackend,
{
	/// Creates an acquirer over `backend` requesting `scope` by default.
	pub fn new(backend: impl Into<Arc<B>>, scope: ScopeSet) -> Self {
		Self {
			backend: backend.into(),
			scope,
			metrics: Default::default(),
			guards: Default::default(),
		}
	}

	/// Backend used for cache probes and exchanges.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Default scope set.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Cache counters shared by all clones of this acquirer.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Returns a request for the default scope, ready to be customized.
	pub fn request(&self) -> AcquireRequest {
		AcquireRequest::new(self.scope.clone())
	}

	/// Returns a usable token for the default scope.
	pub async fn acquire(&self) -> Result<TokenRecord> {
		self.acquire_with(self.request()).await
	}

	/// Returns a usable token for `request`, exchanging credentials only when needed.
	pub async fn acquire_with(&self, request: AcquireRequest) -> Result<TokenRecord> {
		const OPERATION: Operation = Operation::AcquireToken;

		let span = OperationSpan::new(OPERATION, "acquire_with");

		obs::record_operation_outcome(OPERATION, Outcome::Attempt);

		let result = span.instrument(self.acquire_guarded(&request)).await;

		match &result {
			Ok(_) => {},
			Err(Error::Auth(failure)) => {
				self.metrics.record_failure();
				obs::log_auth_failure(failure);
			},
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_operation_outcome(OPERATION, Outcome::of(&result));

		result
	}

	async fn acquire_guarded(&self, request: &AcquireRequest) -> Result<TokenRecord> {
		let guard = self.guard(&request.scope);
		let _singleflight = guard.lock().await;
		let cached = self.backend.probe_cached(&request.scope).await?;
		let now = OffsetDateTime::now_utc();

		match request.miss_reason(cached.as_ref(), now) {
			None =>
				if let Some(record) = cached {
					self.metrics.record_hit();
					obs::record_cache_result(CacheResult::Hit);
					obs::log_cache_hit(&request.scope, record.expires_at);

					return Ok(record);
				},
			Some(reason) => {
				self.metrics.record_miss();
				obs::record_cache_result(CacheResult::Miss);
				obs::log_cache_miss(&request.scope, reason.as_str());
			},
		}

		let record = self.backend.exchange(&request.scope).await?;

		self.metrics.record_exchange();

		Ok(record)
	}

	fn guard(&self, scope: &ScopeSet) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(scope.fingerprint()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl TokenAcquirer<ConfidentialClient> {
	/// Builds an acquirer with the default transport, a memory store, and the configured
	/// scopes.
	pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
		Ok(Self::new(ConfidentialClient::new(credentials)?, credentials.scope.clone()))
	}
}
impl<B> Clone for TokenAcquirer<B>
where
	B: ?Sized + TokenBackend,
{
	fn clone(&self) -> Self {
		Self {
			backend: self.backend.clone(),
			scope: self.scope.clone(),
			metrics: self.metrics.clone(),
			guards: self.guards.clone(),
		}
	}
}
impl<B> Debug for TokenAcquirer<B>
where
	B: ?Sized + TokenBackend,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAcquirer")
			.field("scope", &self.scope)
			.field("metrics", &self.metrics)
			.finish()
	}
}

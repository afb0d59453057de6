//! Token cache contract and the process-local implementation.
//!
//! Records are partitioned by [`StoreKey`]: the owning tenant + client pair and the scope
//! fingerprint. Nothing is persisted across process restarts.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenOwner, TokenRecord},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Cache contract used by the confidential client.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Inserts or replaces the record for its owner + scope.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record associated with the owner + scope, if present.
	fn fetch<'a>(
		&'a self,
		owner: &'a TokenOwner,
		scope: &'a ScopeSet,
	) -> StoreFuture<'a, Option<TokenRecord>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a cached token record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Tenant + client the token belongs to.
	pub owner: TokenOwner,
	/// Scope fingerprint used for partitioning.
	pub scope_fingerprint: String,
}
impl StoreKey {
	/// Builds a key using the provided owner and scope fingerprint.
	pub fn new(owner: &TokenOwner, scope: &ScopeSet) -> Self {
		Self { owner: owner.clone(), scope_fingerprint: scope.fingerprint() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ClientId, TenantId};

	fn owner(client: &str) -> TokenOwner {
		TokenOwner::new(
			TenantId::new("tenant-1").expect("Tenant fixture should be valid."),
			ClientId::new(client).expect("Client fixture should be valid."),
		)
	}

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "cache poisoned".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("cache poisoned"));

		let source =
			StdError::source(&error).expect("Crate error should expose the store error as source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn store_key_partitions_by_owner_and_scope_order_insensitively() {
		let scope_a = ScopeSet::new(["https://graph.microsoft.com/.default", "openid"])
			.expect("First scope fixture should be valid.");
		let scope_b = ScopeSet::new(["openid", "https://graph.microsoft.com/.default"])
			.expect("Second scope fixture should be valid.");

		let key = StoreKey::new(&owner("client-1"), &scope_a);

		assert_eq!(key, StoreKey::new(&owner("client-1"), &scope_b));
		assert_ne!(key, StoreKey::new(&owner("client-2"), &scope_a));
	}
}

//! Thread-safe in-memory [`TokenStore`] living for the lifetime of the process.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenOwner, TokenRecord},
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, TokenRecord>>>;

/// Process-local token cache. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of cached records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, record: TokenRecord) -> Result<(), StoreError> {
		let key = StoreKey::new(&record.owner, &record.scope);

		map.write().insert(key, record);

		Ok(())
	}

	fn fetch_now(map: StoreMap, owner: TokenOwner, scope: ScopeSet) -> Option<TokenRecord> {
		let key = StoreKey::new(&owner, &scope);

		map.read().get(&key).cloned()
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, record) })
	}

	fn fetch<'a>(
		&'a self,
		owner: &'a TokenOwner,
		scope: &'a ScopeSet,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let owner = owner.to_owned();
		let scope = scope.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, owner, scope)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ClientId, TenantId};

	fn owner() -> TokenOwner {
		TokenOwner::new(
			TenantId::new("tenant-1").expect("Tenant fixture should be valid."),
			ClientId::new("client-1").expect("Client fixture should be valid."),
		)
	}

	fn record(token: &str, scope: &ScopeSet) -> TokenRecord {
		TokenRecord::builder(owner(), scope.clone())
			.access_token(token)
			.expires_in(Duration::hours(1))
			.build()
			.expect("Record fixture should build.")
	}

	#[tokio::test]
	async fn save_replaces_and_fetch_is_scope_scoped() {
		let store = MemoryStore::default();
		let graph = ScopeSet::new(["https://graph.microsoft.com/.default"])
			.expect("Graph scope should be valid.");
		let other = ScopeSet::new(["api://other/.default"]).expect("Other scope should be valid.");

		assert!(store.fetch(&owner(), &graph).await.expect("Fetch should succeed.").is_none());

		store.save(record("first", &graph)).await.expect("Save should succeed.");
		store.save(record("second", &graph)).await.expect("Save should succeed.");

		let cached = store
			.fetch(&owner(), &graph)
			.await
			.expect("Fetch should succeed.")
			.expect("Record should be cached.");

		assert_eq!(cached.access_token.expose(), "second");
		assert_eq!(store.len(), 1);
		assert!(store.fetch(&owner(), &other).await.expect("Fetch should succeed.").is_none());
	}

	#[tokio::test]
	async fn clones_share_the_cache() {
		let store = MemoryStore::default();
		let clone = store.clone();
		let scope = ScopeSet::new(["https://graph.microsoft.com/.default"])
			.expect("Scope should be valid.");

		clone.save(record("shared", &scope)).await.expect("Save should succeed.");

		assert!(!store.is_empty());
	}
}

//! Production [`TokenBackend`]: a confidential client with a token cache.

// self
use crate::{
	_prelude::*,
	acquire::{BackendFuture, TokenBackend},
	auth::{ScopeSet, TokenOwner, TokenRecord},
	config::Credentials,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::ConfidentialFacade,
	store::{MemoryStore, TokenStore},
};

/// Confidential client application bound to one tenant.
///
/// [`probe_cached`](TokenBackend::probe_cached) reads the store without any network I/O;
/// [`exchange`](TokenBackend::exchange) posts the client-credentials grant to the token
/// endpoint (client authentication in the request body) and caches the result.
pub struct ConfidentialClient<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	facade: ConfidentialFacade<C>,
	store: Arc<dyn TokenStore>,
}
impl<C> ConfidentialClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a client that reuses the caller-provided transport and store.
	pub fn with_http_client(
		credentials: &Credentials,
		store: Arc<dyn TokenStore>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let facade = ConfidentialFacade::from_credentials(credentials, http_client)?;

		Ok(Self { facade, store })
	}

	/// Tenant + client pair the cached tokens belong to.
	pub fn owner(&self) -> &TokenOwner {
		self.facade.owner()
	}

	/// Token store backing the cache.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}
}
impl ConfidentialClient<ReqwestHttpClient> {
	/// Creates a client with the default reqwest transport and a fresh [`MemoryStore`].
	pub fn new(credentials: &Credentials) -> Result<Self> {
		Self::with_http_client(
			credentials,
			Arc::new(MemoryStore::default()),
			ReqwestHttpClient::new()?,
		)
	}
}
impl<C> TokenBackend for ConfidentialClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn probe_cached<'a>(&'a self, scope: &'a ScopeSet) -> BackendFuture<'a, Option<TokenRecord>> {
		Box::pin(async move {
			<dyn TokenStore>::fetch(self.store.as_ref(), self.owner(), scope)
				.await
				.map_err(Error::from)
		})
	}

	fn exchange<'a>(&'a self, scope: &'a ScopeSet) -> BackendFuture<'a, TokenRecord> {
		Box::pin(async move {
			let record = self.facade.exchange_client_credentials(scope).await?;

			<dyn TokenStore>::save(self.store.as_ref(), record.clone())
				.await
				.map_err(Error::from)?;

			Ok(record)
		})
	}
}
impl<C> Debug for ConfidentialClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfidentialClient").field("owner", self.owner()).finish()
	}
}

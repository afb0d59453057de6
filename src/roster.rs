//! Group membership lookups end to end: acquire a token, then query the directory.

// self
use crate::{
	_prelude::*,
	acquire::{ConfidentialClient, TokenAcquirer, TokenBackend},
	auth::TokenRecord,
	config::Credentials,
	directory::DirectoryClient,
	http::ReqwestHttpClient,
	obs::{self, Operation, OperationSpan, Outcome},
	store::MemoryStore,
};

/// Token acquirer + directory client pair sharing one configuration.
pub struct GroupRoster<B = ConfidentialClient>
where
	B: ?Sized + TokenBackend,
{
	acquirer: TokenAcquirer<B>,
	directory: DirectoryClient,
}
impl<B> GroupRoster<B>
where
	B: ?Sized + TokenBackend,
{
	/// Combines an existing acquirer and directory client.
	pub fn new(acquirer: TokenAcquirer<B>, directory: DirectoryClient) -> Self {
		Self { acquirer, directory }
	}

	/// Token acquirer used before every lookup.
	pub fn acquirer(&self) -> &TokenAcquirer<B> {
		&self.acquirer
	}

	/// Directory client used for the lookups.
	pub fn directory(&self) -> &DirectoryClient {
		&self.directory
	}

	/// Returns a token for the configured scopes (cached when still fresh).
	pub async fn token(&self) -> Result<TokenRecord> {
		self.acquirer.acquire().await
	}

	/// Returns the configured attribute of every member of the first group whose display
	/// name starts with `prefix`.
	pub async fn group_members(&self, prefix: &str) -> Result<Vec<String>> {
		const OPERATION: Operation = Operation::GroupMembers;

		let span = OperationSpan::new(OPERATION, "group_members");

		obs::record_operation_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Vec<String>> = span
			.instrument(async move {
				let token = self.acquirer.acquire().await?;

				self.directory.list_group_members(&token.access_token, prefix).await
			})
			.await;

		obs::record_operation_outcome(OPERATION, Outcome::of(&result));

		result
	}
}
impl GroupRoster<ConfidentialClient> {
	/// Builds both halves from credentials with one shared reqwest transport and a fresh
	/// in-memory token cache.
	pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
		Self::with_http_client(credentials, ReqwestHttpClient::new()?)
	}

	/// Builds both halves from credentials over the provided transport.
	pub fn with_http_client(
		credentials: &Credentials,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let backend = ConfidentialClient::with_http_client(
			credentials,
			Arc::new(MemoryStore::default()),
			http_client.clone(),
		)?;
		let acquirer = TokenAcquirer::new(backend, credentials.scope.clone());
		let directory = DirectoryClient::from_credentials(credentials, http_client)?;

		Ok(Self::new(acquirer, directory))
	}
}
impl<B> Debug for GroupRoster<B>
where
	B: ?Sized + TokenBackend,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GroupRoster")
			.field("acquirer", &self.acquirer)
			.field("directory", &self.directory)
			.finish()
	}
}

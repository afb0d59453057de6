//! The app-only "account" a cached token belongs to.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId},
};

/// Tenant + client pair that owns app-only tokens.
///
/// Client-credentials tokens have no end user, so the application itself is the account
/// under which the cache files its records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenOwner {
	/// Tenant the token was issued in.
	pub tenant: TenantId,
	/// Application the token was issued to.
	pub client_id: ClientId,
}
impl TokenOwner {
	/// Creates an owner for the provided tenant and client.
	pub fn new(tenant: TenantId, client_id: ClientId) -> Self {
		Self { tenant, client_id }
	}
}

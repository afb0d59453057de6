//! Immutable credentials loaded once at startup.
//!
//! Two sources are supported: the process environment ([`Credentials::from_env`]) and a JSON
//! file in the shape of the identity platform's daemon samples
//! ([`Credentials::from_json_file`]). Both produce the same validated [`Credentials`] value,
//! which is then handed explicitly to the token acquirer and the directory client.

// std
use std::{env, fs, path::Path};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, GRAPH_RESOURCE, ScopeSet, Secret, TenantId},
	authority::{self, Authority},
	error::ConfigError,
};

/// Environment variable names; each is tried with the `AZURE_` prefix first.
pub mod vars {
	/// Tenant identifier.
	pub const TENANT_ID: &str = "TENANT_ID";
	/// Application (client) identifier.
	pub const CLIENT_ID: &str = "CLIENT_ID";
	/// Client secret.
	pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
	/// Whitespace-separated short scope names, expanded under Microsoft Graph.
	pub const APP_SCOPE: &str = "APP_SCOPE";
	/// Directory API base URL, e.g. `https://graph.microsoft.com/v1.0`.
	pub const API_ENDPOINT: &str = "API_ENDPOINT";
	/// Member attribute to project, e.g. `mail` or `userPrincipalName`.
	pub const USERNAME_ATTRIBUTE: &str = "USERNAME_ATTRIBUTE";
	/// Optional identity host override.
	pub const AUTHORITY_HOST: &str = "AUTHORITY_HOST";
	/// Prefix tried before the bare names.
	pub const PREFIX: &str = "AZURE_";
}

/// Validated configuration of the confidential client and the directory query.
#[derive(Clone, Debug)]
pub struct Credentials {
	/// Identity host + tenant.
	pub authority: Authority,
	/// Application (client) identifier.
	pub client_id: ClientId,
	/// Client secret; redacted in debug output.
	pub client_secret: Secret,
	/// Scopes requested in the client-credentials exchange.
	pub scope: ScopeSet,
	/// Directory API base URL.
	pub api_endpoint: Url,
	/// Member attribute projected by group listings.
	pub username_attribute: String,
}
impl Credentials {
	/// Validates and assembles credentials from already-parsed parts.
	pub fn new(
		authority: Authority,
		client_id: ClientId,
		client_secret: Secret,
		scope: ScopeSet,
		api_endpoint: Url,
		username_attribute: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let username_attribute = username_attribute.into();

		if scope.is_empty() {
			return Err(ConfigError::EmptyScope);
		}
		if username_attribute.trim().is_empty() {
			return Err(ConfigError::EmptyAttribute);
		}

		authority::validate_endpoint("api", &api_endpoint)?;

		Ok(Self { authority, client_id, client_secret, scope, api_endpoint, username_attribute })
	}

	/// Loads credentials from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads credentials through an arbitrary variable lookup.
	///
	/// Every required name is read as `AZURE_<NAME>` first and `<NAME>` second, except
	/// `USERNAME_ATTRIBUTE`, which has no prefixed form. Blank values count as missing.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &'static str| -> Option<String> {
			lookup(&format!("{}{name}", vars::PREFIX))
				.or_else(|| lookup(name))
				.filter(|value| !value.trim().is_empty())
		};
		let require = |name: &'static str| read(name).ok_or(ConfigError::MissingEnv { name });
		let tenant = TenantId::new(require(vars::TENANT_ID)?)?;
		let client_id = ClientId::new(require(vars::CLIENT_ID)?)?;
		let client_secret = Secret::new(require(vars::CLIENT_SECRET)?);
		let scope_names = require(vars::APP_SCOPE)?;
		let scope = ScopeSet::for_resource(GRAPH_RESOURCE, scope_names.split_whitespace())?;
		let api_endpoint = parse_url("api", &require(vars::API_ENDPOINT)?)?;
		let username_attribute = lookup(vars::USERNAME_ATTRIBUTE)
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingEnv { name: vars::USERNAME_ATTRIBUTE })?;
		let authority = match read(vars::AUTHORITY_HOST) {
			Some(host) => Authority::new(parse_url("authority", &host)?, tenant)?,
			None => Authority::public_cloud(tenant)?,
		};

		Self::new(authority, client_id, client_secret, scope, api_endpoint, username_attribute)
	}

	/// Loads credentials from a JSON configuration file.
	pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let bytes = fs::read(path)
			.map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

		Self::from_json_slice(&bytes)
	}

	/// Parses credentials from JSON bytes.
	///
	/// Expected keys: `authority`, `client_id`, `secret`, `scope` (full scope URIs),
	/// `endpoint`, `username_attribute`.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_slice(bytes);
		let file: CredentialsFile = serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::ParseFile { source })?;

		Self::new(
			Authority::parse(&file.authority)?,
			file.client_id,
			file.secret,
			file.scope,
			parse_url("api", &file.endpoint)?,
			file.username_attribute,
		)
	}

	/// Tenant the application is registered in.
	pub fn tenant(&self) -> &TenantId {
		&self.authority.tenant
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialsFile {
	authority: String,
	client_id: ClientId,
	secret: Secret,
	scope: ScopeSet,
	endpoint: String,
	username_attribute: String,
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { field, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		move |name: &str| map.get(name).cloned()
	}

	fn full_env() -> Vec<(&'static str, &'static str)> {
		vec![
			("TENANT_ID", "tenant-1"),
			("CLIENT_ID", "client-1"),
			("CLIENT_SECRET", "shh"),
			("APP_SCOPE", "default"),
			("API_ENDPOINT", "https://graph.microsoft.com/v1.0"),
			("USERNAME_ATTRIBUTE", "mail"),
		]
	}

	#[test]
	fn env_loads_and_expands_scopes() {
		let credentials =
			Credentials::from_lookup(lookup_from(&full_env())).expect("Full env should load.");

		assert_eq!(credentials.tenant().as_ref(), "tenant-1");
		assert_eq!(credentials.client_id.as_ref(), "client-1");
		assert_eq!(credentials.client_secret.expose(), "shh");
		assert_eq!(credentials.scope.normalized(), "https://graph.microsoft.com/.default");
		assert_eq!(credentials.api_endpoint.as_str(), "https://graph.microsoft.com/v1.0");
		assert_eq!(credentials.username_attribute, "mail");
		assert_eq!(credentials.authority.host.as_str(), "https://login.microsoftonline.com/");
		assert!(!format!("{credentials:?}").contains("shh"));
	}

	#[test]
	fn prefixed_names_take_precedence() {
		let mut env = full_env();

		env.push(("AZURE_TENANT_ID", "prefixed-tenant"));
		env.push(("AZURE_APP_SCOPE", "User.Read.All  Group.Read.All"));
		env.push(("AZURE_AUTHORITY_HOST", "https://login.microsoftonline.us"));

		let credentials =
			Credentials::from_lookup(lookup_from(&env)).expect("Prefixed env should load.");

		assert_eq!(credentials.tenant().as_ref(), "prefixed-tenant");
		assert_eq!(credentials.scope.len(), 2);
		assert!(credentials.scope.contains("https://graph.microsoft.com/.User.Read.All"));
		assert_eq!(credentials.authority.host.as_str(), "https://login.microsoftonline.us/");
	}

	#[test]
	fn each_required_variable_is_enforced() {
		for missing in
			["TENANT_ID", "CLIENT_ID", "CLIENT_SECRET", "APP_SCOPE", "API_ENDPOINT", "USERNAME_ATTRIBUTE"]
		{
			let env: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != missing).collect();
			let err = Credentials::from_lookup(lookup_from(&env))
				.expect_err("Missing variables must fail construction.");

			match err {
				ConfigError::MissingEnv { name } => assert_eq!(name, missing),
				other => panic!("Unexpected error for {missing}: {other:?}."),
			}
		}
	}

	#[test]
	fn blank_values_count_as_missing() {
		let mut env: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != "CLIENT_SECRET").collect();

		env.push(("CLIENT_SECRET", "   "));

		assert!(matches!(
			Credentials::from_lookup(lookup_from(&env)),
			Err(ConfigError::MissingEnv { name: "CLIENT_SECRET" })
		));
	}

	#[test]
	fn insecure_api_endpoint_is_rejected() {
		let mut env: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != "API_ENDPOINT").collect();

		env.push(("API_ENDPOINT", "http://graph.example.com/v1.0"));

		assert!(matches!(
			Credentials::from_lookup(lookup_from(&env)),
			Err(ConfigError::InsecureEndpoint { field: "api", .. })
		));
	}

	#[test]
	fn json_file_shape_is_accepted() {
		let json = br#"{
			"authority": "https://login.microsoftonline.com/contoso",
			"client_id": "client-json",
			"scope": ["https://graph.microsoft.com/.default"],
			"secret": "json-secret",
			"endpoint": "https://graph.microsoft.com/v1.0",
			"username_attribute": "userPrincipalName"
		}"#;
		let credentials = Credentials::from_json_slice(json).expect("JSON config should load.");

		assert_eq!(credentials.tenant().as_ref(), "contoso");
		assert_eq!(credentials.scope.normalized(), "https://graph.microsoft.com/.default");
		assert_eq!(credentials.username_attribute, "userPrincipalName");
	}

	#[test]
	fn json_errors_carry_the_field_path() {
		let json = br#"{
			"authority": "https://login.microsoftonline.com/contoso",
			"client_id": "has space",
			"scope": [],
			"secret": "x",
			"endpoint": "https://graph.microsoft.com/v1.0",
			"username_attribute": "mail"
		}"#;
		let err = Credentials::from_json_slice(json).expect_err("Invalid client id must fail.");

		match err {
			ConfigError::ParseFile { source } => assert_eq!(source.path().to_string(), "client_id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn json_requires_scopes() {
		let json = br#"{
			"authority": "https://login.microsoftonline.com/contoso",
			"client_id": "client",
			"scope": [],
			"secret": "x",
			"endpoint": "https://graph.microsoft.com/v1.0",
			"username_attribute": "mail"
		}"#;

		assert!(matches!(Credentials::from_json_slice(json), Err(ConfigError::EmptyScope)));
	}

	#[test]
	fn unreadable_file_reports_path() {
		let err = Credentials::from_json_file("/nonexistent/graph-roster/config.json")
			.expect_err("Missing files must fail.");

		assert!(matches!(err, ConfigError::ReadFile { .. }));
		assert!(err.to_string().contains("/nonexistent/graph-roster/config.json"));
	}
}

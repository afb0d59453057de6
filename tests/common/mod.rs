//! Shared fixtures for integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
// self
use graph_roster::{
	auth::{ClientId, ScopeSet, Secret},
	authority::Authority,
	config::Credentials,
	http::ReqwestHttpClient,
	reqwest::Client,
	url::Url,
};

pub const TENANT: &str = "tenant-it";
pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const GRAPH_DEFAULT: &str = "https://graph.microsoft.com/.default";

/// Path of the v2.0 token endpoint under the mock authority.
pub fn token_path() -> String {
	format!("/{TENANT}/oauth2/v2.0/token")
}

/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(graph_roster::reqwest::redirect::Policy::none())
		.build()
		.expect("Failed to build insecure reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Credentials whose authority and directory endpoint both point at `server`.
pub fn credentials(server: &MockServer, username_attribute: &str) -> Credentials {
	let authority = Authority::parse(&server.url(format!("/{TENANT}")))
		.expect("Mock authority should parse.");
	let api_endpoint =
		Url::parse(&server.url("/v1.0")).expect("Mock directory endpoint should parse.");

	Credentials::new(
		authority,
		ClientId::new(CLIENT_ID).expect("Client fixture should be valid."),
		Secret::new(CLIENT_SECRET),
		ScopeSet::new([GRAPH_DEFAULT]).expect("Scope fixture should be valid."),
		api_endpoint,
		username_attribute,
	)
	.expect("Mock credentials should validate.")
}

/// Token endpoint success body.
pub fn token_body(access_token: &str, expires_in: i64) -> String {
	format!(
		"{{\"token_type\":\"Bearer\",\"expires_in\":{expires_in},\"ext_expires_in\":{expires_in},\"access_token\":\"{access_token}\"}}"
	)
}

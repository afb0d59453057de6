//! `oauth2` crate facade for the client-credentials exchange.
//!
//! The identity platform extends the RFC 6749 error body with `error_codes`, `trace_id`, and
//! `correlation_id`; [`AuthorityErrorResponse`] plugs into `oauth2` as the client's error
//! type so none of those fields are lost before they reach [`AuthFailure`].

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, Client, ClientId as OAuthClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ErrorResponse, HttpClientError, RequestTokenError, Scope, StandardRevocableToken,
	TokenResponse, TokenUrl,
	basic::{BasicRevocationErrorResponse, BasicTokenIntrospectionResponse, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthFailure, ScopeSet, TokenOwner, TokenRecord},
	config::Credentials,
	error::{ConfigError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type ConfiguredClient = Client<
	AuthorityErrorResponse,
	BasicTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Error body returned by the identity platform's token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityErrorResponse {
	/// OAuth `error` code.
	pub error: String,
	/// Human-readable description, usually prefixed with the AADSTS number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
	/// Numeric AADSTS codes.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub error_codes: Vec<u32>,
	/// Server-side trace identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trace_id: Option<String>,
	/// Correlation identifier to quote in support requests.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub correlation_id: Option<String>,
	/// Server timestamp of the failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	/// Troubleshooting link.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_uri: Option<String>,
}
impl AuthorityErrorResponse {
	/// Converts the body into a classified [`AuthFailure`].
	pub fn into_failure(self, meta: Option<&ResponseMetadata>) -> AuthFailure {
		AuthFailure::from_provider(
			self.error,
			self.error_description,
			self.error_codes,
			meta_status(meta),
		)
		.with_correlation_id(self.correlation_id)
		.with_trace_id(self.trace_id)
		.with_trace_id(meta_request_id(meta))
	}
}
impl Display for AuthorityErrorResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.error_description {
			Some(description) => write!(f, "{}: {description}", self.error),
			None => f.write_str(&self.error),
		}
	}
}
impl ErrorResponse for AuthorityErrorResponse {}

pub(crate) struct ConfidentialFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	owner: TokenOwner,
}
impl<C> ConfidentialFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	pub(crate) fn from_credentials(
		credentials: &Credentials,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let token_endpoint = credentials.authority.token_endpoint()?;
		let token_url = TokenUrl::from_url(token_endpoint);
		let oauth_client = Client::new(OAuthClientId::new(credentials.client_id.to_string()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url);
		let owner = TokenOwner::new(credentials.tenant().clone(), credentials.client_id.clone());

		Ok(Self { oauth_client, http_client: http_client.into(), owner })
	}

	pub(crate) fn owner(&self) -> &TokenOwner {
		&self.owner
	}

	/// Posts `grant_type=client_credentials` with the requested scopes.
	pub(crate) fn exchange_client_credentials<'a>(
		&'a self,
		scope: &'a ScopeSet,
	) -> FacadeFuture<'a, TokenRecord> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_client_credentials();

			for entry in scope.iter() {
				request = request.add_scope(Scope::new(entry.to_owned()));
			}

			let response = request
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err))?;
			let meta = meta.take();

			map_token_response(self.owner.clone(), scope.clone(), response, meta.as_ref())
		})
	}
}

/// Maps transport failures that happened while calling `target`.
pub(crate) fn map_transport_error<E>(target: &'static str, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(target, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		_ => TransportError::Other { message: "unclassified HTTP client failure".into() }.into(),
	}
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, AuthorityErrorResponse>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => response.into_failure(meta).into(),
		RequestTokenError::Request(error) => map_transport_error(TransportError::TOKEN_ENDPOINT, error),
		RequestTokenError::Parse(error, _body) => {
			let description =
				format!("Token endpoint body is not decodable at `{}`: {}", error.path(), error.inner());

			unexpected_body(description, meta).into()
		},
		RequestTokenError::Other(message) => unexpected_body(message, meta).into(),
	}
}

// A 2xx body we cannot use is malformed; a non-2xx body that is not an OAuth error is
// classified by its status.
fn unexpected_body(description: String, meta: Option<&ResponseMetadata>) -> AuthFailure {
	let status = meta_status(meta);
	let failure = match status {
		Some(code) if !(200..300).contains(&code) => AuthFailure::from_provider(
			"unexpected_response",
			Some(description),
			Vec::new(),
			status,
		),
		_ => AuthFailure::malformed("invalid_response", description, status),
	};

	failure.with_trace_id(meta_request_id(meta))
}

fn map_token_response(
	owner: TokenOwner,
	scope: ScopeSet,
	response: BasicTokenResponse,
	meta: Option<&ResponseMetadata>,
) -> Result<TokenRecord> {
	let malformed = |description: String| {
		AuthFailure::malformed("invalid_response", description, meta_status(meta))
			.with_trace_id(meta_request_id(meta))
	};
	let expires_in = response
		.expires_in()
		.map(|lifetime| lifetime.as_secs())
		.filter(|secs| *secs > 0)
		.ok_or_else(|| malformed("Token response lacks a positive `expires_in`".into()))?;
	let expires_in = i64::try_from(expires_in)
		.map_err(|_| malformed(format!("Token lifetime {expires_in}s is out of range")))?;

	TokenRecord::builder(owner, scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(|err| malformed(err.to_string()).into())
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_request_id(meta: Option<&ResponseMetadata>) -> Option<String> {
	meta.and_then(|value| value.request_id.clone())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::AuthFailureKind, http::ReqwestHttpClient};

	#[test]
	fn error_body_keeps_provider_fields() {
		let body = br#"{
			"error": "invalid_client",
			"error_description": "AADSTS7000215: Invalid client secret provided.",
			"error_codes": [7000215],
			"timestamp": "2025-01-01 00:00:00Z",
			"trace_id": "trace-body",
			"correlation_id": "corr-1",
			"error_uri": "https://login.microsoftonline.com/error?code=7000215"
		}"#;
		let response: AuthorityErrorResponse =
			serde_json::from_slice(body).expect("Error body should decode.");
		let meta = ResponseMetadata { status: Some(401), request_id: Some("req-1".into()) };
		let failure = response.into_failure(Some(&meta));

		assert_eq!(failure.kind, AuthFailureKind::InvalidClient);
		assert_eq!(failure.code, "invalid_client");
		assert_eq!(failure.error_codes, vec![7000215]);
		assert_eq!(failure.correlation_id.as_deref(), Some("corr-1"));
		assert_eq!(failure.trace_id.as_deref(), Some("trace-body"));
		assert_eq!(failure.status, Some(401));
	}

	#[test]
	fn minimal_error_body_falls_back_to_header_trace() {
		let response: AuthorityErrorResponse =
			serde_json::from_slice(br#"{"error":"invalid_scope"}"#)
				.expect("Minimal error body should decode.");

		assert_eq!(response.to_string(), "invalid_scope");

		let meta = ResponseMetadata { status: Some(400), request_id: Some("req-2".into()) };
		let failure = response.into_failure(Some(&meta));

		assert_eq!(failure.kind, AuthFailureKind::InvalidScope);
		assert_eq!(failure.trace_id.as_deref(), Some("req-2"));
	}

	#[test]
	fn non_success_garbage_is_classified_by_status() {
		let meta = ResponseMetadata { status: Some(503), request_id: None };
		let failure = unexpected_body("<html>".into(), Some(&meta));

		assert_eq!(failure.kind, AuthFailureKind::Transient);

		let meta = ResponseMetadata { status: Some(200), request_id: None };
		let failure = unexpected_body("<html>".into(), Some(&meta));

		assert_eq!(failure.kind, AuthFailureKind::MalformedResponse);
	}

	#[test]
	fn facade_builds_from_credentials() {
		let json = br#"{
			"authority": "https://login.microsoftonline.com/contoso",
			"client_id": "client",
			"scope": ["https://graph.microsoft.com/.default"],
			"secret": "x",
			"endpoint": "https://graph.microsoft.com/v1.0",
			"username_attribute": "mail"
		}"#;
		let credentials = Credentials::from_json_slice(json).expect("Fixture should load.");
		let http = ReqwestHttpClient::new().expect("Client should build.");
		let facade = <ConfidentialFacade<ReqwestHttpClient>>::from_credentials(&credentials, http)
			.expect("Facade should build.");

		assert_eq!(facade.owner().tenant.as_ref(), "contoso");
		assert_eq!(facade.owner().client_id.as_ref(), "client");
	}
}

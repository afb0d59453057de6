//! Structured token-exchange failures and their classification.
//!
//! The identity platform answers rejected client-credentials requests with an OAuth error
//! body extended by `error_codes` (AADSTS numbers), `trace_id`, and `correlation_id`.
//! [`AuthFailure`] keeps all of it so callers can decide to retry, abort, or escalate with
//! the correlation identifier. Classification looks at the AADSTS codes first, then the
//! OAuth `error` field, then the description text, and finally the HTTP status.

// self
use crate::_prelude::*;

/// Canonical categories for rejected token exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureKind {
	/// Client authentication failed (unknown application, bad or expired secret).
	InvalidClient,
	/// The grant itself was refused.
	InvalidGrant,
	/// The requested scope is malformed or not granted to the application.
	InvalidScope,
	/// The tenant does not exist or cannot be used by the application.
	InvalidTenant,
	/// Temporary upstream failure; retrying later may succeed.
	Transient,
	/// The token endpoint answered with something that is not a usable token response.
	MalformedResponse,
}
impl AuthFailureKind {
	/// Returns a stable label suitable for logs or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidClient => "invalid_client",
			Self::InvalidGrant => "invalid_grant",
			Self::InvalidScope => "invalid_scope",
			Self::InvalidTenant => "invalid_tenant",
			Self::Transient => "transient",
			Self::MalformedResponse => "malformed_response",
		}
	}
}
impl Display for AuthFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token exchange that did not yield an access token.
///
/// `code` is always populated: either the provider's OAuth `error` value or a local code
/// (`invalid_response`, `unexpected_response`) when the body was unusable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error(
	"Token exchange failed with `{code}`: {}.",
	.description.as_deref().unwrap_or("no description supplied")
)]
pub struct AuthFailure {
	/// Classified category.
	pub kind: AuthFailureKind,
	/// OAuth `error` code.
	pub code: String,
	/// Human-readable `error_description`.
	pub description: Option<String>,
	/// Identifier to quote when escalating to the provider's support.
	pub correlation_id: Option<String>,
	/// Provider trace identifier (body `trace_id` or the `x-ms-request-id` header).
	pub trace_id: Option<String>,
	/// Numeric AADSTS codes reported by the provider.
	pub error_codes: Vec<u32>,
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
}
impl AuthFailure {
	/// Builds a classified failure from the provider's error fields.
	pub fn from_provider(
		code: impl Into<String>,
		description: Option<String>,
		error_codes: Vec<u32>,
		status: Option<u16>,
	) -> Self {
		let code = code.into();
		let kind = classify(&code, description.as_deref(), &error_codes, status);

		Self {
			kind,
			code,
			description,
			correlation_id: None,
			trace_id: None,
			error_codes,
			status,
		}
	}

	/// Builds a failure for a response that could not be used as a token response.
	pub fn malformed(
		code: impl Into<String>,
		description: impl Into<String>,
		status: Option<u16>,
	) -> Self {
		Self {
			kind: AuthFailureKind::MalformedResponse,
			code: code.into(),
			description: Some(description.into()),
			correlation_id: None,
			trace_id: None,
			error_codes: Vec::new(),
			status,
		}
	}

	/// Attaches the provider correlation identifier.
	pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
		self.correlation_id = correlation_id;

		self
	}

	/// Attaches the trace identifier unless one is already set.
	pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
		if self.trace_id.is_none() {
			self.trace_id = trace_id;
		}

		self
	}

	/// Returns true when retrying the exchange later may succeed.
	pub fn is_transient(&self) -> bool {
		matches!(self.kind, AuthFailureKind::Transient)
	}
}

fn classify(
	code: &str,
	description: Option<&str>,
	error_codes: &[u32],
	status: Option<u16>,
) -> AuthFailureKind {
	error_codes
		.iter()
		.find_map(|aadsts| classify_aadsts(*aadsts))
		.or_else(|| match_exact_value(code))
		.or_else(|| description.and_then(classify_text))
		.unwrap_or_else(|| classify_status(status))
}

fn classify_aadsts(code: u32) -> Option<AuthFailureKind> {
	match code {
		// Unknown application, invalid secret, expired secret, missing credential.
		700016 | 7000215 | 7000222 | 7000216 => Some(AuthFailureKind::InvalidClient),
		// Tenant not found, tenant disabled, app not in tenant.
		90002 | 90072 | 500011 => Some(AuthFailureKind::InvalidTenant),
		// Invalid or unconsented scope.
		70011 | 1002012 | 65001 => Some(AuthFailureKind::InvalidScope),
		// Throttled or internal server error.
		50196 | 90033 | 90036 => Some(AuthFailureKind::Transient),
		_ => None,
	}
}

fn match_exact_value(value: &str) -> Option<AuthFailureKind> {
	if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(AuthFailureKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("access_denied")
		|| value.eq_ignore_ascii_case("unsupported_grant_type")
	{
		Some(AuthFailureKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_scope") {
		Some(AuthFailureKind::InvalidScope)
	} else if value.eq_ignore_ascii_case("invalid_tenant") {
		Some(AuthFailureKind::InvalidTenant)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(AuthFailureKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: &str) -> Option<AuthFailureKind> {
	let lowered = text.to_ascii_lowercase();

	match lowered.as_str() {
		t if t.contains("invalid_client") || t.contains("client secret") =>
			Some(AuthFailureKind::InvalidClient),
		t if t.contains("tenant") && t.contains("not found") => Some(AuthFailureKind::InvalidTenant),
		t if t.contains("invalid_scope") || t.contains("scope") =>
			Some(AuthFailureKind::InvalidScope),
		t if t.contains("temporarily_unavailable") || t.contains("retry") =>
			Some(AuthFailureKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> AuthFailureKind {
	match status {
		Some(400 | 404) => AuthFailureKind::InvalidGrant,
		Some(401 | 403) => AuthFailureKind::InvalidClient,
		_ => AuthFailureKind::Transient,
	}
}

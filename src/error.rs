//! Crate-level error types shared by token acquisition, configuration, and directory lookups.

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, auth::AuthFailure, directory::DirectoryError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; fatal at startup.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token exchange did not yield an access token.
	#[error(transparent)]
	Auth(#[from] AuthFailure),
	/// Directory lookup returned no usable data.
	#[error(transparent)]
	Directory(#[from] DirectoryError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Returns the structured authentication failure, if this error carries one.
	pub fn as_auth_failure(&self) -> Option<&AuthFailure> {
		match self {
			Self::Auth(failure) => Some(failure),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required environment variable is absent or blank.
	#[error("Environment variable `{name}` is required.")]
	MissingEnv {
		/// Primary variable name that was looked up.
		name: &'static str,
	},
	/// Identifier validation failed.
	#[error("Identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// No scope was configured.
	#[error("At least one scope must be configured.")]
	EmptyScope,
	/// The attribute projected from member records is blank.
	#[error("The username attribute cannot be empty.")]
	EmptyAttribute,
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured endpoint does not use HTTPS.
	#[error("The {field} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A configured endpoint cannot carry path segments.
	#[error("The {field} endpoint cannot be used as a base URL: {url}.")]
	UnsupportedEndpoint {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Authority URL does not end with a tenant segment.
	#[error("Authority `{url}` does not name a tenant.")]
	MissingTenant {
		/// Authority URL that failed validation.
		url: String,
	},
	/// Configuration file could not be read.
	#[error("Failed to read configuration file {}.", .path.display())]
	ReadFile {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration file is not valid JSON for the expected shape.
	#[error("Configuration file is malformed at `{}`.", .source.path())]
	ParseFile {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Remote the request was addressed to.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// HTTP client reported a failure it could not classify.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Remote label for identity-platform calls.
	pub const TOKEN_ENDPOINT: &'static str = "the token endpoint";
	/// Remote label for directory calls.
	pub const DIRECTORY: &'static str = "the directory API";

	/// Wraps a transport-specific network error raised while calling `target`.
	pub fn network(target: &'static str, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { target, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_env_names_the_variable() {
		let err: Error = ConfigError::MissingEnv { name: "AZURE_TENANT_ID" }.into();

		assert!(matches!(err, Error::Config(ConfigError::MissingEnv { .. })));
		assert_eq!(err.to_string(), "Environment variable `AZURE_TENANT_ID` is required.");
		assert!(err.as_auth_failure().is_none());
	}

	#[test]
	fn network_error_exposes_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err: Error = TransportError::network(TransportError::DIRECTORY, io).into();
		let source = StdError::source(&err).expect("Transport error should expose its source.");

		assert!(err.to_string().contains("the directory API"));
		assert_eq!(source.to_string(), "refused");
	}
}

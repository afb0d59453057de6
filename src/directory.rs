//! Microsoft Graph group lookups authorized by an app-only bearer token.
//!
//! Two sequential calls make up a listing: the group is resolved by display-name prefix
//! (first match wins), then its members are fetched and one attribute is projected from
//! each. Only the first page of either collection is read.

pub mod model;

pub use model::{Group, Member};

// crates.io
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	authority,
	config::Credentials,
	error::{ConfigError, TransportError},
	http::{self, ReqwestHttpClient},
	obs::{self, Operation, OperationSpan, Outcome},
};
use model::{ErrorEnvelope, Page};

/// Directory lookups that returned no usable data.
#[derive(Debug, ThisError)]
pub enum DirectoryError {
	/// No group display name starts with the prefix.
	#[error("No group display name starts with `{prefix}`.")]
	GroupNotFound {
		/// Prefix used in the filter.
		prefix: String,
	},
	/// A member lacks the projected attribute (absent or `null`).
	#[error(
		"Member #{index} ({}) has no `{attribute}` value.",
		.member_id.as_deref().unwrap_or("unknown id")
	)]
	MissingAttribute {
		/// Attribute that was projected.
		attribute: String,
		/// Position of the member in the listing.
		index: usize,
		/// Member object identifier, if present.
		member_id: Option<String>,
	},
	/// A member's attribute is an object or array and has no single text form.
	#[error(
		"Member #{index} ({}) has a non-scalar `{attribute}` value.",
		.member_id.as_deref().unwrap_or("unknown id")
	)]
	UnsupportedAttribute {
		/// Attribute that was projected.
		attribute: String,
		/// Position of the member in the listing.
		index: usize,
		/// Member object identifier, if present.
		member_id: Option<String>,
	},
	/// The directory answered with a non-success status.
	#[error(
		"Directory {operation} request failed with HTTP {status}: {}.",
		.message.as_deref().unwrap_or("no message supplied")
	)]
	Status {
		/// Operation label.
		operation: &'static str,
		/// HTTP status code.
		status: u16,
		/// Graph error code, e.g. `Authorization_RequestDenied`.
		code: Option<String>,
		/// Graph error message.
		message: Option<String>,
		/// `request-id` response header.
		request_id: Option<String>,
	},
	/// A success body did not match the expected shape.
	#[error("Directory {operation} response is malformed at `{}`.", .source.path())]
	Parse {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl DirectoryError {
	fn from_status(
		operation: Operation,
		status: u16,
		request_id: Option<String>,
		body: &[u8],
	) -> Self {
		let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();

		Self::Status {
			operation: operation.as_str(),
			status,
			code: envelope.error.code,
			message: envelope.error.message,
			request_id,
		}
	}
}

/// Client for the directory API rooted at the configured endpoint.
#[derive(Clone, Debug)]
pub struct DirectoryClient {
	http_client: ReqwestHttpClient,
	api_endpoint: Url,
	username_attribute: String,
}
impl DirectoryClient {
	/// Creates a client with the default transport.
	pub fn new(
		api_endpoint: Url,
		username_attribute: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::with_http_client(ReqwestHttpClient::new()?, api_endpoint, username_attribute)
	}

	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		http_client: ReqwestHttpClient,
		api_endpoint: Url,
		username_attribute: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let username_attribute = username_attribute.into();

		if username_attribute.trim().is_empty() {
			return Err(ConfigError::EmptyAttribute);
		}

		authority::validate_endpoint("api", &api_endpoint)?;

		Ok(Self { http_client, api_endpoint, username_attribute })
	}

	/// Creates a client from loaded credentials.
	pub fn from_credentials(
		credentials: &Credentials,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		Self::with_http_client(
			http_client,
			credentials.api_endpoint.clone(),
			credentials.username_attribute.clone(),
		)
	}

	/// Attribute projected by [`list_group_members`](Self::list_group_members).
	pub fn username_attribute(&self) -> &str {
		&self.username_attribute
	}

	/// Resolves the first group whose display name starts with `prefix`.
	pub async fn resolve_group(&self, token: &Secret, prefix: &str) -> Result<Group> {
		const OPERATION: Operation = Operation::ResolveGroup;

		let span = OperationSpan::new(OPERATION, "resolve_group");

		obs::record_operation_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Group> = span
			.instrument(async move {
				let url = self.groups_url(prefix)?;
				let page: Page<Group> = self.get_json(OPERATION, url, token).await?;

				page.value
					.into_iter()
					.next()
					.ok_or_else(|| DirectoryError::GroupNotFound { prefix: prefix.to_owned() }.into())
			})
			.await;

		obs::record_operation_outcome(OPERATION, Outcome::of(&result));

		result
	}

	/// Lists the first page of members of the group with identifier `group_id`.
	pub async fn list_members(&self, token: &Secret, group_id: &str) -> Result<Vec<Member>> {
		const OPERATION: Operation = Operation::ListMembers;

		let span = OperationSpan::new(OPERATION, "list_members");

		obs::record_operation_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Vec<Member>> = span
			.instrument(async move {
				let url = authority::join_segments(
					"api",
					&self.api_endpoint,
					["groups", group_id, "members"],
				)?;
				let page: Page<Member> = self.get_json(OPERATION, url, token).await?;

				if page.next_link.is_some() {
					obs::log_truncated_listing(OPERATION, page.value.len());
				}

				Ok(page.value)
			})
			.await;

		obs::record_operation_outcome(OPERATION, Outcome::of(&result));

		result
	}

	/// Resolves the group by prefix and returns the configured attribute of each member,
	/// in the order the directory returned them.
	pub async fn list_group_members(&self, token: &Secret, prefix: &str) -> Result<Vec<String>> {
		const OPERATION: Operation = Operation::ListGroupMembers;

		let span = OperationSpan::new(OPERATION, "list_group_members");

		obs::record_operation_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Vec<String>> = span
			.instrument(async move {
				let group = self.resolve_group(token, prefix).await?;
				let members = self.list_members(token, &group.id).await?;

				Ok(Self::project(&members, &self.username_attribute)?)
			})
			.await;

		obs::record_operation_outcome(OPERATION, Outcome::of(&result));

		result
	}

	/// Projects `attribute` from every member, preserving order.
	///
	/// Strings are returned verbatim and numbers or booleans as their JSON text. An absent or
	/// `null` value fails with [`DirectoryError::MissingAttribute`]; objects and arrays fail
	/// with [`DirectoryError::UnsupportedAttribute`].
	pub fn project(members: &[Member], attribute: &str) -> Result<Vec<String>, DirectoryError> {
		members
			.iter()
			.enumerate()
			.map(|(index, member)| {
				let member_id = || member.id().map(str::to_owned);

				match member.attribute(attribute) {
					Some(Value::String(value)) => Ok(value.clone()),
					Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(value.to_string()),
					None | Some(Value::Null) => Err(DirectoryError::MissingAttribute {
						attribute: attribute.to_owned(),
						index,
						member_id: member_id(),
					}),
					Some(Value::Array(_) | Value::Object(_)) =>
						Err(DirectoryError::UnsupportedAttribute {
							attribute: attribute.to_owned(),
							index,
							member_id: member_id(),
						}),
				}
			})
			.collect()
	}

	fn groups_url(&self, prefix: &str) -> Result<Url, ConfigError> {
		let mut url = authority::join_segments("api", &self.api_endpoint, ["groups"])?;
		let filter = odata_startswith("displayName", prefix);
		// Spaces as `%20` rather than `+`; a literal `+` is already escaped as `%2B`.
		let encoded = form_urlencoded::byte_serialize(filter.as_bytes())
			.collect::<String>()
			.replace('+', "%20");

		url.set_query(Some(&format!("$filter={encoded}")));

		Ok(url)
	}

	async fn get_json<T>(&self, operation: Operation, url: Url, token: &Secret) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let network = |e: ReqwestError| TransportError::network(TransportError::DIRECTORY, e);
		let response = self
			.http_client
			.get(url)
			.bearer_auth(token.expose())
			.header(ACCEPT, "application/json")
			.send()
			.await
			.map_err(network)?;
		let status = response.status();
		let request_id = http::request_id(response.headers());
		let body = response.bytes().await.map_err(network)?;

		if !status.is_success() {
			return Err(DirectoryError::from_status(operation, status.as_u16(), request_id, &body)
				.into());
		}

		let de = &mut serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| DirectoryError::Parse { operation: operation.as_str(), source }.into())
	}
}

/// Builds `startswith(<property>,'<prefix>')` with the prefix quoted as an OData literal.
pub fn odata_startswith(property: &str, prefix: &str) -> String {
	format!("startswith({property},'{}')", prefix.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn members(values: Value) -> Vec<Member> {
		serde_json::from_value(values).expect("Member fixture should decode.")
	}

	fn client() -> DirectoryClient {
		DirectoryClient::new(
			Url::parse("https://graph.microsoft.com/v1.0").expect("Endpoint should parse."),
			"mail",
		)
		.expect("Directory client should build.")
	}

	#[test]
	fn odata_literals_double_single_quotes() {
		assert_eq!(odata_startswith("displayName", "g1"), "startswith(displayName,'g1')");
		assert_eq!(odata_startswith("displayName", "O'Brien"), "startswith(displayName,'O''Brien')");
	}

	#[test]
	fn groups_url_encodes_the_filter() {
		let url = client().groups_url("Team A&B").expect("Groups URL should build.");

		assert_eq!(url.path(), "/v1.0/groups");

		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs, vec![("$filter".into(), "startswith(displayName,'Team A&B')".into())]);
		assert!(url.as_str().contains("Team%20A%26B"));
	}

	#[test]
	fn projection_keeps_order_and_scalar_text() {
		let listed = members(json!([
			{"id": "1", "mail": "a@x.com"},
			{"id": "2", "mail": "b@x.com"},
			{"id": "3", "mail": 42},
			{"id": "4", "mail": true}
		]));
		let projected =
			DirectoryClient::project(&listed, "mail").expect("Scalar attributes should project.");

		assert_eq!(projected, vec!["a@x.com", "b@x.com", "42", "true"]);
		assert!(DirectoryClient::project(&[], "mail").expect("Empty input is fine.").is_empty());
	}

	#[test]
	fn projection_rejects_missing_null_and_structured_values() {
		let absent = members(json!([{"id": "1", "mail": "a@x.com"}, {"id": "2"}]));

		match DirectoryClient::project(&absent, "mail") {
			Err(DirectoryError::MissingAttribute { attribute, index, member_id }) => {
				assert_eq!(attribute, "mail");
				assert_eq!(index, 1);
				assert_eq!(member_id.as_deref(), Some("2"));
			},
			other => panic!("Unexpected projection result: {other:?}."),
		}

		let null = members(json!([{"mail": null}]));

		assert!(matches!(
			DirectoryClient::project(&null, "mail"),
			Err(DirectoryError::MissingAttribute { index: 0, member_id: None, .. })
		));

		let nested = members(json!([{"id": "9", "mail": ["a@x.com"]}]));

		assert!(matches!(
			DirectoryClient::project(&nested, "mail"),
			Err(DirectoryError::UnsupportedAttribute { .. })
		));
	}

	#[test]
	fn status_errors_read_the_graph_envelope() {
		let body = br#"{"error":{"code":"Authorization_RequestDenied","message":"Insufficient privileges to complete the operation"}}"#;
		let err = DirectoryError::from_status(Operation::ListMembers, 403, Some("req-9".into()), body);

		match &err {
			DirectoryError::Status { operation, status, code, request_id, .. } => {
				assert_eq!(*operation, "list_members");
				assert_eq!(*status, 403);
				assert_eq!(code.as_deref(), Some("Authorization_RequestDenied"));
				assert_eq!(request_id.as_deref(), Some("req-9"));
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		assert_eq!(
			err.to_string(),
			"Directory list_members request failed with HTTP 403: \
			 Insufficient privileges to complete the operation."
		);

		let opaque = DirectoryError::from_status(Operation::ResolveGroup, 502, None, b"<html>");

		assert!(matches!(opaque, DirectoryError::Status { code: None, message: None, .. }));
	}

	#[test]
	fn blank_attribute_or_insecure_endpoint_is_rejected() {
		let endpoint = Url::parse("https://graph.microsoft.com/v1.0").expect("Endpoint should parse.");

		assert!(matches!(
			DirectoryClient::new(endpoint, " "),
			Err(ConfigError::EmptyAttribute)
		));
		assert!(matches!(
			DirectoryClient::new(
				Url::parse("http://graph.example.com/v1.0").expect("Endpoint should parse."),
				"mail"
			),
			Err(ConfigError::InsecureEndpoint { .. })
		));
	}
}

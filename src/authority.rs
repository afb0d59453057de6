//! Identity authority addressing and endpoint validation.
//!
//! An [`Authority`] is the identity host plus the tenant segment
//! (`https://login.microsoftonline.com/<tenant>`). The client-credentials exchange posts to
//! the v2.0 token endpoint below it.

// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{_prelude::*, auth::TenantId, error::ConfigError};

/// Public-cloud identity host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const VERSION_SEGMENT: &str = "v2.0";
const TOKEN_PATH: [&str; 3] = ["oauth2", VERSION_SEGMENT, "token"];

/// Identity host + tenant pair used for every token exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
	/// Identity host (scheme + host, optional port).
	pub host: Url,
	/// Tenant the application is registered in.
	pub tenant: TenantId,
}
impl Authority {
	/// Creates an authority after validating the host.
	pub fn new(host: Url, tenant: TenantId) -> Result<Self, ConfigError> {
		validate_endpoint("authority", &host)?;

		Ok(Self { host, tenant })
	}

	/// Creates an authority on the public-cloud host.
	pub fn public_cloud(tenant: TenantId) -> Result<Self, ConfigError> {
		let host = Url::parse(DEFAULT_AUTHORITY_HOST)
			.map_err(|source| ConfigError::InvalidUrl { field: "authority", source })?;

		Self::new(host, tenant)
	}

	/// Parses a full authority URL such as `https://login.microsoftonline.com/contoso`.
	///
	/// The last non-empty path segment is the tenant; everything before it is the host. A
	/// trailing `v2.0` version segment (`.../contoso/v2.0`) is dropped before the tenant is read.
	pub fn parse(authority: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(authority)
			.map_err(|source| ConfigError::InvalidUrl { field: "authority", source })?;
		let mut segments: Vec<&str> = url
			.path_segments()
			.map(|segments| segments.filter(|s| !s.is_empty()).collect())
			.unwrap_or_default();

		if segments.last().is_some_and(|last| last.eq_ignore_ascii_case(VERSION_SEGMENT)) {
			segments.pop();
		}

		let tenant = segments
			.pop()
			.ok_or_else(|| ConfigError::MissingTenant { url: authority.to_owned() })?;
		let tenant = TenantId::new(tenant)?;
		let mut host = url.clone();

		host.set_query(None);
		host.set_fragment(None);
		host.set_path(&segments.join("/"));

		Self::new(host, tenant)
	}

	/// Returns `<host>/<tenant>`.
	pub fn url(&self) -> Result<Url, ConfigError> {
		join_segments("authority", &self.host, [self.tenant.as_ref()])
	}

	/// Returns `<host>/<tenant>/oauth2/v2.0/token`.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		let url = self.url()?;

		join_segments("authority", &url, TOKEN_PATH)
	}
}

/// Appends path segments to `base`, percent-encoding each one.
pub fn join_segments<'a, I>(field: &'static str, base: &Url, segments: I) -> Result<Url, ConfigError>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::UnsupportedEndpoint { field, url: base.to_string() })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

/// Requires HTTPS, except for loopback hosts used by local stubs.
pub fn validate_endpoint(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.cannot_be_a_base() {
		return Err(ConfigError::UnsupportedEndpoint { field, url: url.to_string() });
	}

	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { field, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

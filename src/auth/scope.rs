//! Scope sets requested from the identity platform.

// std
use std::{collections::BTreeSet, sync::OnceLock};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Resource prefix applied to short scope names such as `default`.
pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com/";

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized set of OAuth scopes with a stable fingerprint cache.
///
/// Scopes are deduplicated and sorted so the same request always maps to the same
/// cache partition. The [`fingerprint`](Self::fingerprint) is a base64 (no padding)
/// SHA-256 digest of the space-delimited form, computed once per value.
#[derive(Default)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
	fingerprint_cache: OnceLock<String>,
}
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: normalize(scopes)?, fingerprint_cache: OnceLock::new() })
	}

	/// Expands short names (`default`, `User.Read.All`) under a resource URI.
	///
	/// Each entry becomes `<resource>.<entry>`, so `default` under [`GRAPH_RESOURCE`]
	/// yields `https://graph.microsoft.com/.default`.
	pub fn for_resource<'a, I>(resource: &str, entries: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut expanded = Vec::new();

		for entry in entries {
			if entry.is_empty() {
				return Err(ScopeValidationError::Empty);
			}

			expanded.push(format!("{resource}.{entry}"));
		}

		Self::new(expanded)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the normalized set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Returns the space-delimited form sent in the `scope` form field.
	pub fn normalized(&self) -> String {
		self.scopes.join(" ")
	}

	/// Stable fingerprint derived from the normalized scope list.
	pub fn fingerprint(&self) -> String {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).clone()
	}
}
impl Clone for ScopeSet {
	fn clone(&self) -> Self {
		Self { scopes: self.scopes.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl PartialEq for ScopeSet {
	fn eq(&self, other: &Self) -> bool {
		self.scopes == other.scopes
	}
}
impl Eq for ScopeSet {}
impl Hash for ScopeSet {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).hash(state);
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeSet::new(values).map_err(DeError::custom)
	}
}

fn normalize<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut set = BTreeSet::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}

		set.insert(owned);
	}

	Ok(Arc::from(set.into_iter().collect::<Vec<_>>()))
}

fn compute_fingerprint(scopes: &[String]) -> String {
	let mut hasher = Sha256::new();

	hasher.update(scopes.join(" ").as_bytes());

	STANDARD_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn short_names_expand_under_graph() {
		let scope = ScopeSet::for_resource(GRAPH_RESOURCE, "default".split_whitespace())
			.expect("Default scope should expand.");

		assert_eq!(scope.normalized(), "https://graph.microsoft.com/.default");
		assert!(scope.contains("https://graph.microsoft.com/.default"));
	}

	#[test]
	fn expansion_rejects_blank_entries() {
		let err = ScopeSet::for_resource(GRAPH_RESOURCE, ["default", ""])
			.expect_err("Blank entries must be rejected.");

		assert_eq!(err, ScopeValidationError::Empty);
	}

	#[test]
	fn scopes_normalize_and_fingerprint_stably() {
		let lhs = ScopeSet::new(["User.Read.All", "Group.Read.All", "Group.Read.All"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new(["Group.Read.All", "User.Read.All"])
			.expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.len(), 2);
		assert_eq!(lhs.normalized(), "Group.Read.All User.Read.All");
		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
		assert_eq!(lhs.fingerprint(), lhs.clone().fingerprint());
	}

	#[test]
	fn whitespace_is_rejected() {
		assert!(matches!(
			ScopeSet::new([" padded "]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
		assert!(ScopeSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
		assert_eq!(
			ScopeSet::from_str("b a").expect("Scope string should parse.").iter().collect::<Vec<_>>(),
			vec!["a", "b"]
		);
	}
}

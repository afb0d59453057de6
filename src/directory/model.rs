//! Microsoft Graph wire models used by the directory client.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Group returned by the display-name filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
	/// Directory object identifier.
	pub id: String,
	/// Display name, when the directory returned one.
	#[serde(rename = "displayName", default)]
	pub display_name: Option<String>,
}

/// Directory object listed as a group member, kept as its raw attribute map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(pub Map<String, Value>);
impl Member {
	/// Directory object identifier, if present.
	pub fn id(&self) -> Option<&str> {
		self.0.get("id").and_then(Value::as_str)
	}

	/// Raw attribute value; `None` when the attribute is absent.
	pub fn attribute(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}
}
impl From<Map<String, Value>> for Member {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}

/// OData collection page (`{"value": [...], "@odata.nextLink": "..."}`).
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
	pub(crate) value: Vec<T>,
	#[serde(rename = "@odata.nextLink", default)]
	pub(crate) next_link: Option<String>,
}

/// Graph error envelope (`{"error": {"code": "...", "message": "..."}}`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
	#[serde(default)]
	pub(crate) error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
	#[serde(default)]
	pub(crate) code: Option<String>,
	#[serde(default)]
	pub(crate) message: Option<String>,
}

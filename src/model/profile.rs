//! Structured profile data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root key some profile files wrap their content in.
pub const DEFAULT_ROOT_NAME: &str = "resume";

/// A JSON profile: `name`, `experience` entries, optional `custom_sections`.
///
/// Unknown keys are preserved so templates can reach them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    /// Build a profile from a JSON value, unwrapping a single-key
    /// `{root_name: {...}}` wrapper if present.
    pub fn from_value(value: Value, root_name: &str) -> Option<Self> {
        match unwrap_root(value, root_name) {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Parse a profile from JSON text.
    pub fn from_json(json: &str, root_name: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value, root_name)
            .ok_or_else(|| crate::Error::Schema("profile root must be a JSON object".into()))
    }

    /// The profile owner's name, if present and a string.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Experience entries, empty if absent.
    pub fn experience(&self) -> &[Value] {
        self.list("experience")
    }

    /// Custom sections, empty if absent.
    pub fn custom_sections(&self) -> &[Value] {
        self.list("custom_sections")
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn list(&self, key: &str) -> &[Value] {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Unwrap `{root_name: inner}` to `inner`; any other value is returned as is.
pub fn unwrap_root(value: Value, root_name: &str) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(root_name) => {
            map.remove(root_name).unwrap_or(Value::Null)
        }
        other => other,
    }
}

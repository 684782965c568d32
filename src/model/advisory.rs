use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Third-party cross reference that must never reach the output.
pub const CROSS_REFERENCE_FIELD: &str = "github_security_advisory";

/// One advisory record.
///
/// The report attributes (id, description, affected versions, references,
/// ...) are opaque to the engine and kept as a JSON object. The loader adds
/// `distribution`, and optionally `darkpan` and `url`, before the record is
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Advisory {
    fields: Map<String, Value>,
}

impl Advisory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn distribution(&self) -> Option<&str> {
        self.fields.get("distribution").and_then(Value::as_str)
    }

    /// True only when the record was stamped as coming from a dark-pan source.
    pub fn is_darkpan(&self) -> bool {
        matches!(self.fields.get("darkpan"), Some(Value::Bool(true)))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

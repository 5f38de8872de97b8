//! Asset metadata records and the recognized asset kinds.
//!
//! Records are stored exactly as supplied: a record is a JSON object whose
//! fields pass through the store unvalidated. Well-known fields get typed
//! accessors; everything else round-trips verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Asset kinds with a defined XML projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// A character.
    Char,
    /// A background image.
    Bg,
    /// A saved movie.
    Movie,
    /// A prop (static or video).
    Prop,
    /// An audio clip.
    Sound,
}

impl AssetKind {
    /// Returns the string representation of the kind (the `type` field value).
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Char => "char",
            AssetKind::Bg => "bg",
            AssetKind::Movie => "movie",
            AssetKind::Prop => "prop",
            AssetKind::Sound => "sound",
        }
    }

    /// Parse a kind from a `type` field value.
    ///
    /// Returns `None` for unrecognized strings; records with such a `type`
    /// are stored like any other but have no XML projection.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "char" => Some(AssetKind::Char),
            "bg" => Some(AssetKind::Bg),
            "movie" => Some(AssetKind::Movie),
            "prop" => Some(AssetKind::Prop),
            "sound" => Some(AssetKind::Sound),
            _ => None,
        }
    }
}

/// One asset's metadata: a JSON object stored as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRecord {
    fields: Map<String, Value>,
}

impl AssetRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field as a string slice, if present and a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The assigned asset id, if any.
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// The parsed asset kind, if the `type` field holds a recognized value.
    pub fn kind(&self) -> Option<AssetKind> {
        self.str_field("type").and_then(AssetKind::parse)
    }

    /// The `subtype` field, if present and a string.
    pub fn subtype(&self) -> Option<&str> {
        self.str_field("subtype")
    }

    /// Whether this record's subtype implies a companion thumbnail blob.
    pub fn has_companion_thumbnail(&self) -> bool {
        matches!(self.subtype(), Some("char") | Some("video"))
    }

    /// Shallow-merge `patch` onto this record. Fields present in `patch`
    /// replace the existing values; all other fields are preserved.
    pub fn merge(&mut self, patch: AssetRecord) {
        for (key, value) in patch.fields {
            self.fields.insert(key, value);
        }
    }

    /// Whether this record passes every filter entry.
    ///
    /// A record is excluded only when it holds a present and truthy value for
    /// a filter key that differs from the filter's value. A record lacking the
    /// field, or holding a falsy value for it, always passes that entry. This
    /// makes falsy stored values act as wildcards, which is the matching rule
    /// callers of `list` rely on.
    pub fn matches(&self, filters: &Map<String, Value>) -> bool {
        for (key, want) in filters {
            if let Some(have) = self.fields.get(key) {
                if is_truthy(have) && have != want {
                    return false;
                }
            }
        }
        true
    }

    /// Borrow the underlying field map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record, yielding the underlying field map.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for AssetRecord {
    fn from(fields: Map<String, Value>) -> Self {
        AssetRecord { fields }
    }
}

/// Truthiness of a JSON value, matching the convention the filter rule was
/// observed under: null, false, numeric zero and the empty string are falsy;
/// arrays and objects (even empty ones) are truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

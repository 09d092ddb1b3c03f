//! Presence-tracked request decoding.
//!
//! A PATCH body has to tell apart three states per field: absent (leave the
//! column alone), present with `null` (clear the column) and present with a
//! value. Once a body is deserialized into a typed record, an absent field and
//! an explicit `null` both end up as `None`, so [`decode`] records which keys
//! were actually sent before handing the payload to serde.
//!
//! ```ignore
//! let patch = ledgersql::decode_str::<AccountPatch>(r#"{"icon": null}"#)?;
//! assert!(patch.has_field("icon"));
//! assert!(!patch.has_field("displayName"));
//! ```

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{LedgerError, LedgerResult};

/// Wire-level field names a decodable record accepts.
pub trait FieldSet {
    /// Every accepted top-level key, spelled exactly as on the wire.
    const FIELDS: &'static [&'static str];
}

/// Names of the top-level keys that appeared in a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSet {
    names: BTreeSet<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// True iff `name` appeared as a key, whatever its value.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PresenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A decoded record together with the keys that were present in its payload.
#[derive(Debug, Clone)]
pub struct Presence<T> {
    value: T,
    fields: PresenceSet,
}

impl<T> Presence<T> {
    /// Pair a record with an explicit presence set, e.g. for requests built in code.
    pub fn new(value: T, fields: PresenceSet) -> Self {
        Self { value, fields }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn fields(&self) -> &PresenceSet {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn into_parts(self) -> (T, PresenceSet) {
        (self.value, self.fields)
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Decode a JSON object into `T`, recording which top-level keys were sent.
///
/// Unknown keys are rejected so client typos surface as errors instead of
/// being silently dropped.
pub fn decode<T>(raw: &[u8]) -> LedgerResult<Presence<T>>
where
    T: DeserializeOwned + FieldSet,
{
    let payload: Value = serde_json::from_slice(raw)
        .map_err(|e| LedgerError::encoding(format!("malformed payload: {e}")))?;

    let Value::Object(map) = payload else {
        return Err(LedgerError::encoding(format!(
            "expected a JSON object, got {}",
            json_kind(&payload)
        )));
    };

    let fields = presence_of::<T>(&map)?;
    let value = serde_json::from_value(Value::Object(map))
        .map_err(|e| LedgerError::encoding(e.to_string()))?;

    Ok(Presence { value, fields })
}

/// [`decode`] for string input.
pub fn decode_str<T>(raw: &str) -> LedgerResult<Presence<T>>
where
    T: DeserializeOwned + FieldSet,
{
    decode(raw.as_bytes())
}

fn presence_of<T: FieldSet>(map: &Map<String, Value>) -> LedgerResult<PresenceSet> {
    let mut fields = PresenceSet::new();
    for key in map.keys() {
        if !T::FIELDS.contains(&key.as_str()) {
            return Err(LedgerError::encoding(format!(
                "unknown field '{key}', expected one of: {}",
                T::FIELDS.join(", ")
            )));
        }
        fields.insert(key.as_str());
    }
    Ok(fields)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
